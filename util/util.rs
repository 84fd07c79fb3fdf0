#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use image::RgbaImage;
use palette::Srgb;
use palettize::Palette;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

pub fn load_images(images: &[PathBuf]) -> Vec<(String, RgbaImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image.into_rgba8(),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, RgbaImage)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths = entries
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

pub const UNSPLASH_DIR: &str = "img/unsplash/img";

pub fn load_image_dir_relative_to_root(dir: impl AsRef<Path>) -> Vec<(String, RgbaImage)> {
    // assume current exe path is something like: target/build/deps/current_exe
    let exe = std::env::current_exe().unwrap();
    let root = exe
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap();

    load_image_dir(root.join(dir.as_ref()))
}

/// A smooth gradient with a band of random noise and a translucent border.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = if y % 64 < 16 { rng.gen() } else { r / 2 + g / 2 };
        let a = if x < 4 || y < 4 { 64 } else { 255 };
        image::Rgba([r, g, b, a])
    })
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, RgbaImage)>> = OnceLock::new();

/// The images under [`UNSPLASH_DIR`], or synthetic images if there are none.
pub fn benchmark_images() -> &'static [(String, RgbaImage)] {
    BENCHMARK_IMAGES.get_or_init(|| {
        let images = load_image_dir_relative_to_root(UNSPLASH_DIR);
        if images.is_empty() {
            vec![
                ("synthetic_640x480".to_owned(), synthetic_image(640, 480, 0)),
                ("synthetic_1920x1080".to_owned(), synthetic_image(1920, 1080, 1)),
            ]
        } else {
            images
        }
    })
}

/// A palette of `k` random colors, preceded by the sentinel.
pub fn random_palette(k: usize, seed: u64) -> Palette<u8> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let colors = (0..k)
        .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
        .collect::<Vec<_>>();
    Palette::with_sentinel(colors).unwrap()
}
