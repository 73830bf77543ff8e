use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use image::imageops::FilterType;
use image::DynamicImage;
use pixelbattle_core::{
    ApiError, CellCoord, Color, GridDims, PixelApi, PlacePixelRequest, WriteIntent,
};
use rand::seq::SliceRandom;
use url::Url;

use crate::http_api::HttpApi;

#[derive(clap::Args)]
pub(super) struct BotArgs {
    image: PathBuf,
    #[arg(long, default_value_t = 10)]
    workers: usize,
    #[arg(long, default_value_t = 100)]
    start_x: u32,
    #[arg(long, default_value_t = 100)]
    start_y: u32,
    #[arg(long, default_value_t = 256)]
    target_width: u32,
    #[arg(long, default_value = "pixel_bot_progress.txt")]
    progress_file: PathBuf,
    #[arg(long)]
    resume: bool,
    /// Attempts per pixel before a failing write is given up on.
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct BotPixel {
    pub coord: CellCoord,
    pub color: Color,
}

pub(super) async fn run(
    args: BotArgs,
    api_url: Url,
    dims: GridDims,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::open(&args.image)?;
    let mut pixels = pixelate(&image, args.target_width, CellCoord::new(args.start_x, args.start_y));
    let before = pixels.len();
    pixels.retain(|pixel| dims.contains_cell(pixel.coord));
    if pixels.len() < before {
        tracing::warn!(dropped = before - pixels.len(), "image extends past the grid");
    }
    println!("loaded {} pixels from image", pixels.len());
    pixels.shuffle(&mut rand::rng());

    let api = HttpApi::new(api_url);
    let mut done = match api.fetch_grid().await {
        Ok(response) => already_correct(&pixels, &response.grid),
        Err(err) => {
            tracing::warn!(%err, "could not check canvas state");
            HashSet::new()
        }
    };
    println!("{} pixels already in the correct state", done.len());
    if args.resume {
        match load_progress(&args.progress_file) {
            Ok(resumed) => {
                println!("resumed {} pixels from {}", resumed.len(), args.progress_file.display());
                done.extend(resumed);
            }
            Err(err) => {
                tracing::warn!(%err, path = %args.progress_file.display(), "cannot resume");
            }
        }
    }

    let todo: VecDeque<(BotPixel, u32)> = pixels
        .into_iter()
        .filter(|pixel| !done.contains(&pixel.coord))
        .map(|pixel| (pixel, 0))
        .collect();
    if todo.is_empty() {
        println!("all pixels are already in the correct state");
        return Ok(());
    }
    let total = todo.len();
    let workers = args.workers.max(1);
    println!("placing {total} pixels with {workers} workers");

    let run = BotRun {
        api: &api,
        queue: RefCell::new(todo),
        placed: RefCell::new(done),
        newly_placed: Cell::new(0),
        skipped: Cell::new(0),
        failed: Cell::new(0),
        max_attempts: args.max_attempts.max(1),
    };
    let interrupted = tokio::select! {
        _ = join_all((0..workers).map(|_| run.worker(uuid::Uuid::new_v4().to_string()))) => false,
        _ = tokio::signal::ctrl_c() => true,
    };

    save_progress(&args.progress_file, &run.placed.borrow())?;
    println!(
        "placed {}, skipped {} on cooldown, gave up on {}; progress saved to {}",
        run.newly_placed.get(),
        run.skipped.get(),
        run.failed.get(),
        args.progress_file.display()
    );
    if interrupted {
        return Err("interrupted".into());
    }
    Ok(())
}

/// Nearest-neighbour resize to `target_width`, keeping the aspect ratio.
/// Pure white is skipped since it matches the background.
pub(super) fn pixelate(image: &DynamicImage, target_width: u32, origin: CellCoord) -> Vec<BotPixel> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || target_width == 0 {
        return Vec::new();
    }
    let target_height = (u64::from(height) * u64::from(target_width) / u64::from(width)) as u32;
    if target_height == 0 {
        return Vec::new();
    }
    let resized = image
        .resize_exact(target_width, target_height, FilterType::Nearest)
        .to_rgb8();
    resized
        .enumerate_pixels()
        .filter_map(|(x, y, pixel)| {
            let [r, g, b] = pixel.0;
            let color = Color::from_rgb(r, g, b);
            if color.is_white() {
                return None;
            }
            let (Some(x), Some(y)) = (origin.x.checked_add(x), origin.y.checked_add(y)) else {
                tracing::debug!(x, y, "target cell out of range");
                return None;
            };
            Some(BotPixel {
                coord: CellCoord::new(x, y),
                color,
            })
        })
        .collect()
}

/// Cells whose current colour already matches. Unset cells count as white.
pub(super) fn already_correct(
    pixels: &[BotPixel],
    grid: &HashMap<String, String>,
) -> HashSet<CellCoord> {
    pixels
        .iter()
        .filter(|pixel| {
            grid.get(&pixel.coord.key())
                .map(String::as_str)
                .unwrap_or("#FFFFFF")
                .eq_ignore_ascii_case(pixel.color.as_str())
        })
        .map(|pixel| pixel.coord)
        .collect()
}

/// Progress file: a count line, then one `x,y` line per placed cell.
pub(super) fn save_progress(path: &Path, placed: &HashSet<CellCoord>) -> std::io::Result<()> {
    let mut text = format!("{}\n", placed.len());
    for coord in placed {
        text.push_str(&coord.key());
        text.push('\n');
    }
    std::fs::write(path, text)
}

pub(super) fn load_progress(path: &Path) -> Result<HashSet<CellCoord>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines();
    let count: usize = lines.next().ok_or("empty progress file")?.trim().parse()?;
    let mut placed = HashSet::with_capacity(count);
    for line in lines.take(count) {
        placed.insert(CellCoord::parse_key(line.trim())?);
    }
    Ok(placed)
}

struct BotRun<'a, A: PixelApi> {
    api: &'a A,
    queue: RefCell<VecDeque<(BotPixel, u32)>>,
    placed: RefCell<HashSet<CellCoord>>,
    newly_placed: Cell<usize>,
    skipped: Cell<usize>,
    failed: Cell<usize>,
    max_attempts: u32,
}

impl<A: PixelApi> BotRun<'_, A> {
    async fn worker(&self, client_id: String) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some((pixel, attempts)) = next else {
                break;
            };
            if self.placed.borrow().contains(&pixel.coord) {
                continue;
            }
            let intent = WriteIntent::new(pixel.coord, pixel.color.clone());
            let request = PlacePixelRequest::new(&intent, &client_id);
            match self.api.place_pixel(&request).await {
                Ok(()) => {
                    self.placed.borrow_mut().insert(pixel.coord);
                    let count = self.newly_placed.get() + 1;
                    self.newly_placed.set(count);
                    if count % 100 == 0 {
                        tracing::info!(count, remaining = self.queue.borrow().len(), "progress");
                    }
                }
                Err(err) if is_rate_limited(&err) => {
                    self.skipped.set(self.skipped.get() + 1);
                }
                Err(err) => {
                    if attempts + 1 < self.max_attempts {
                        self.queue.borrow_mut().push_back((pixel, attempts + 1));
                    } else {
                        tracing::warn!(%err, x = pixel.coord.x, y = pixel.coord.y, "giving up on pixel");
                        self.failed.set(self.failed.get() + 1);
                    }
                }
            }
        }
    }
}

fn is_rate_limited(err: &ApiError) -> bool {
    matches!(err, ApiError::Rejected { status: 429, .. }) || err.cooldown().is_some()
}
