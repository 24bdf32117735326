//! Welcome-image compositor.
//!
//! Pipeline: pick a random background from the configured pool, download the
//! member's avatar, circle-crop it, paste it with a white ring, draw the two
//! caption lines, encode to PNG. Every stage failure is returned as
//! [`Error::Image`] with the stage name; nothing in here panics or escapes to
//! the calling event listener. Pixel work runs on the blocking pool.

use crate::adapters::REQUEST_TIMEOUT;
use crate::config::WelcomeConfig;
use crate::errors::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_text_mut, text_size};
use rand::seq::IndexedRandom;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Avatars are resized to this square before circle-cropping.
pub const AVATAR_SIZE: u32 = 300;
/// Vertical offset of the avatar's top edge on the background.
const AVATAR_TOP: i64 = 190;
/// Width of the white ring around the avatar.
const RING_STROKE: i32 = 5;
const TITLE_TOP: i32 = 600;
const NAME_TOP: i32 = 750;
const TITLE_SCALE: f32 = 100.0;
const NAME_SCALE: f32 = 60.0;
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Generates a welcome image for `member_name` joining `server_name`.
///
/// # Errors
/// Returns [`Error::Image`] tagged with the failing stage: background
/// selection/load, avatar download/decode, font load, composition, or encode.
pub async fn generate(
    client: &reqwest::Client,
    config: &WelcomeConfig,
    avatar_url: &str,
    member_name: &str,
    server_name: &str,
) -> Result<Vec<u8>> {
    let background_path = pick_background(config)?;
    let avatar_bytes = download_avatar(client, avatar_url).await?;
    let fonts = Fonts::load(config)?;

    let title = format!("Welcome to {server_name}");
    let name_line = member_name.to_string();
    let bytes = tokio::task::spawn_blocking(move || {
        compose(&background_path, &avatar_bytes, &fonts, &title, &name_line)
    })
    .await
    .map_err(|err| Error::image("compose", err))??;

    info!(member = member_name, server = server_name, "generated welcome image");
    Ok(bytes)
}

fn pick_background(config: &WelcomeConfig) -> Result<PathBuf> {
    let chosen = config
        .backgrounds
        .choose(&mut rand::rng())
        .ok_or_else(|| Error::image("background", "no background images configured"))?;
    Ok(config.background_dir.join(chosen))
}

async fn download_avatar(client: &reqwest::Client, avatar_url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(avatar_url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|err| Error::image("avatar download", err))?;
    if !response.status().is_success() {
        return Err(Error::image(
            "avatar download",
            format!("avatar endpoint returned HTTP {}", response.status()),
        ));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| Error::image("avatar download", err))?;
    Ok(bytes.to_vec())
}

/// The two caption fonts, loaded fresh per generation.
struct Fonts {
    bold: FontVec,
    light: FontVec,
}

impl Fonts {
    fn load(config: &WelcomeConfig) -> Result<Self> {
        Ok(Self {
            bold: load_font(&config.bold_font, &config.fallback_font)?,
            light: load_font(&config.light_font, &config.fallback_font)?,
        })
    }
}

/// Loads `primary`, falling back to `fallback`; fails closed when neither is
/// readable.
fn load_font(primary: &Path, fallback: &Path) -> Result<FontVec> {
    let bytes = match std::fs::read(primary) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                font = %primary.display(),
                %err,
                "primary font unavailable, trying fallback"
            );
            std::fs::read(fallback).map_err(|fallback_err| {
                Error::image(
                    "font load",
                    format!(
                        "neither {} nor fallback {} is readable: {fallback_err}",
                        primary.display(),
                        fallback.display()
                    ),
                )
            })?
        }
    };
    FontVec::try_from_vec(bytes).map_err(|err| Error::image("font load", err))
}

fn compose(
    background_path: &Path,
    avatar_bytes: &[u8],
    fonts: &Fonts,
    title: &str,
    name: &str,
) -> Result<Vec<u8>> {
    let mut canvas = compose_base(background_path, avatar_bytes)?;
    draw_centered_line(&mut canvas, &fonts.bold, TITLE_SCALE, TITLE_TOP, title);
    draw_centered_line(&mut canvas, &fonts.light, NAME_SCALE, NAME_TOP, name);
    encode_png(canvas)
}

/// Background + circle-cropped avatar + white ring, no text yet.
fn compose_base(background_path: &Path, avatar_bytes: &[u8]) -> Result<RgbaImage> {
    let mut canvas = image::open(background_path)
        .map_err(|err| {
            Error::image(
                "background",
                format!("{}: {err}", background_path.display()),
            )
        })?
        .to_rgba8();

    let avatar = image::load_from_memory(avatar_bytes)
        .map_err(|err| Error::image("avatar decode", err))?
        .resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3)
        .to_rgba8();
    let avatar = circle_crop(avatar);

    let paste_x = canvas.width().saturating_sub(AVATAR_SIZE) / 2;
    image::imageops::overlay(&mut canvas, &avatar, i64::from(paste_x), AVATAR_TOP);

    let center = (
        (paste_x + AVATAR_SIZE / 2) as i32,
        AVATAR_TOP as i32 + (AVATAR_SIZE / 2) as i32,
    );
    let radius = (AVATAR_SIZE / 2) as i32;
    for r in radius..radius + RING_STROKE {
        draw_hollow_circle_mut(&mut canvas, center, r, WHITE);
    }

    Ok(canvas)
}

/// Zeroes the alpha of every pixel outside the inscribed circle.
fn circle_crop(mut avatar: RgbaImage) -> RgbaImage {
    let (width, height) = avatar.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let radius = width.min(height) as f32 / 2.0;
    for (x, y, pixel) in avatar.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        if dx * dx + dy * dy > radius * radius {
            pixel.0[3] = 0;
        }
    }
    avatar
}

fn draw_centered_line(canvas: &mut RgbaImage, font: &FontVec, scale: f32, top: i32, text: &str) {
    let scale = PxScale::from(scale);
    let (text_width, _) = text_size(scale, font, text);
    let x = (canvas.width() as i32 - text_width as i32) / 2;
    draw_text_mut(canvas, WHITE, x.max(0), top, scale, font, text);
}

fn encode_png(canvas: RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| Error::image("encode", err))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("commander-bot-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_background(dir: &Path, filename: &str, width: u32, height: u32) {
        let background = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        DynamicImage::ImageRgba8(background)
            .save(dir.join(filename))
            .unwrap();
    }

    fn avatar_png() -> Vec<u8> {
        let avatar = RgbaImage::from_pixel(64, 64, Rgba([200, 40, 40, 255]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(avatar)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_empty_background_pool_fails_closed() {
        let config = WelcomeConfig {
            backgrounds: Vec::new(),
            ..WelcomeConfig::default()
        };
        assert!(matches!(
            pick_background(&config),
            Err(Error::Image { stage: "background", .. })
        ));
    }

    #[test]
    fn test_circle_crop_clears_corners_keeps_center() {
        let avatar = RgbaImage::from_pixel(50, 50, Rgba([1, 2, 3, 255]));
        let cropped = circle_crop(avatar);
        assert_eq!(cropped.get_pixel(0, 0).0[3], 0);
        assert_eq!(cropped.get_pixel(49, 49).0[3], 0);
        assert_eq!(cropped.get_pixel(25, 25).0[3], 255);
    }

    #[test]
    fn test_composed_base_keeps_background_dimensions() {
        let dir = test_dir("base");
        write_background(&dir, "bg.png", 800, 900);
        let canvas = compose_base(&dir.join("bg.png"), &avatar_png()).unwrap();
        assert_eq!(canvas.dimensions(), (800, 900));
        // the avatar center should no longer be the background color
        let avatar_center = canvas.get_pixel(400, AVATAR_TOP as u32 + AVATAR_SIZE / 2);
        assert_eq!(avatar_center.0[..3], [200, 40, 40]);
    }

    #[test]
    fn test_encoded_output_decodes_to_expected_dimensions() {
        let dir = test_dir("encode");
        write_background(&dir, "bg.png", 640, 800);
        let canvas = compose_base(&dir.join("bg.png"), &avatar_png()).unwrap();
        let bytes = encode_png(canvas).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 640);
        assert_eq!(decoded.height(), 800);
    }

    #[test]
    fn test_garbage_avatar_bytes_fail_closed() {
        let dir = test_dir("garbage");
        write_background(&dir, "bg.png", 640, 800);
        let result = compose_base(&dir.join("bg.png"), b"not an image");
        assert!(matches!(
            result,
            Err(Error::Image { stage: "avatar decode", .. })
        ));
    }

    #[test]
    fn test_missing_fonts_fail_closed() {
        let result = load_font(
            Path::new("/nonexistent/Poppins-Bold.ttf"),
            Path::new("/nonexistent/Fallback.ttf"),
        );
        assert!(matches!(result, Err(Error::Image { stage: "font load", .. })));
    }

    #[tokio::test]
    async fn test_unreachable_avatar_url_returns_failure() {
        let dir = test_dir("download");
        write_background(&dir, "bg.png", 640, 800);
        let config = WelcomeConfig {
            background_dir: dir,
            backgrounds: vec!["bg.png".to_string()],
            ..WelcomeConfig::default()
        };
        let client = reqwest::Client::new();
        // nothing listens on the discard port; the connection is refused
        let result = generate(
            &client,
            &config,
            "http://127.0.0.1:9/avatar.png",
            "newcomer",
            "Test Server",
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::Image { stage: "avatar download", .. })
        ));
    }
}
