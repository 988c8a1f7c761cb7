use std::fs;
use std::path::PathBuf;

use ogsnap::rendering::render_region;
use ogsnap::loader::DefaultImageLoader;
use ogsnap::{CaptureConfig, PreviewRegion};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn load_region(name: &str) -> PreviewRegion {
    let raw = fs::read_to_string(format!("tests/goldens/regions/{}.json", name)).expect("read fixture");
    let v: serde_json::Value = serde_json::from_str(&raw).expect("fixture json");
    let field = |k: &str| v.get(k).and_then(|x| x.as_str()).unwrap_or_default().to_string();
    PreviewRegion::new(field("title"), field("content"), field("image_url"))
}

#[test]
fn golden_card_matches_fixture() {
    let region = load_region("card1");
    let cfg = CaptureConfig::default();
    let loader = DefaultImageLoader::new(&cfg).expect("loader");
    let shot = render_region(&region, cfg.viewport, &cfg.theme, &loader).expect("render");

    assert_eq!((shot.width, shot.height), (1200, 630));
    assert_eq!(&shot.png_data[0..8], b"\x89PNG\r\n\x1a\n");

    // Pixels are content-addressed; PNG bytes may vary with encoder versions
    let expected_path = golden_path("card1.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &shot.fingerprint).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let exp = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
        panic!("reading {:?} ({}); run with UPDATE_GOLDENS=1 to create it", expected_path, e)
    });
    assert_eq!(shot.fingerprint, exp.trim());
}

#[test]
fn golden_render_is_repeatable() {
    let region = load_region("card1");
    let cfg = CaptureConfig::default();
    let loader = DefaultImageLoader::new(&cfg).expect("loader");
    let a = render_region(&region, cfg.viewport, &cfg.theme, &loader).expect("render");
    let b = render_region(&region, cfg.viewport, &cfg.theme, &loader).expect("render");
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(hex::decode(&a.fingerprint).expect("hex").len(), 32);
}
