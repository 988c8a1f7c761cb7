use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use ogsnap::meta::{OG_IMAGE, OG_IMAGE_HEIGHT, OG_IMAGE_WIDTH};
use ogsnap::{
    CaptureCompletion, CaptureConfig, GeneratedImage, HeadMetadata, ImageDataUri, PostEditor,
    Theme, Viewport,
};

fn config() -> CaptureConfig {
    CaptureConfig {
        viewport: Viewport { width: 400, height: 210 },
        document_url: Some("https://blog.example/posts/new".into()),
        timeout_ms: 5000,
        ..Default::default()
    }
}

fn decode(image: &GeneratedImage) -> RgbaImage {
    let png = image.data_uri.decode().expect("decode data uri");
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    image::load_from_memory(&png).expect("valid png").to_rgba8()
}

fn has_color(img: &RgbaImage, rgba: [u8; 4]) -> bool {
    img.pixels().any(|p| p.0 == rgba)
}

fn green_data_uri() -> String {
    let img = RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    ImageDataUri::from_png(&out.into_inner()).to_string()
}

#[tokio::test]
async fn hello_world_without_image() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.set_title("Hello");
    editor.set_content("World");
    editor.set_image_url("");

    let ticket = editor.generate_preview_image();
    assert_eq!(editor.next_completion().await, Some(CaptureCompletion::Applied(ticket)));

    let image = editor.generated_image().expect("generated image").clone();
    assert!(image.data_uri.as_str().starts_with("data:image/png;base64,"));
    let pixels = decode(&image);
    assert_eq!(pixels.dimensions(), (400, 210));

    let theme = Theme::default();
    assert!(has_color(&pixels, theme.foreground), "text was drawn");
    assert!(!has_color(&pixels, theme.accent), "no image frame without an image URL");

    assert_eq!(editor.head().meta_property(OG_IMAGE), Some(image.data_uri.as_str()));
    assert_eq!(editor.head().meta_property(OG_IMAGE_WIDTH), Some("400"));
    assert_eq!(editor.head().meta_property(OG_IMAGE_HEIGHT), Some("210"));
}

#[tokio::test]
async fn empty_preview_is_capturable() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.generate_preview_image();
    let done = editor.settle().await;
    assert!(matches!(done.as_slice(), [CaptureCompletion::Applied(_)]));

    let image = editor.generated_image().expect("generated image");
    let pixels = decode(image);
    let bg = Theme::default().background;
    assert!(pixels.pixels().all(|p| p.0 == bg));
}

#[tokio::test]
async fn data_uri_image_is_drawn() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.set_title("Pic");
    editor.set_image_url(green_data_uri());
    editor.generate_preview_image();
    editor.settle().await;

    let pixels = decode(editor.generated_image().expect("generated image"));
    assert!(pixels.pixels().any(|p| p[1] > 240 && p[0] < 20 && p[2] < 20));
    assert!(has_color(&pixels, Theme::default().accent));
}

#[tokio::test]
async fn invalid_image_url_renders_placeholder() {
    let cfg = CaptureConfig {
        document_url: None,
        ..config()
    };
    let mut editor = PostEditor::new(cfg).await.expect("editor");
    editor.set_title("Broken");
    editor.set_image_url("::not a url::");
    editor.generate_preview_image();
    let done = editor.settle().await;
    assert!(matches!(done.as_slice(), [CaptureCompletion::Applied(_)]));
    assert!(editor.last_error().is_none());

    let pixels = decode(editor.generated_image().expect("generated image"));
    assert!(has_color(&pixels, Theme::default().accent));
}

#[tokio::test]
async fn rapid_double_trigger_keeps_latest() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.set_title("First");
    let first = editor.generate_preview_image();
    editor.set_title("Second");
    let second = editor.generate_preview_image();

    let done = editor.settle().await;
    assert_eq!(done.len(), 2);
    assert!(done.contains(&CaptureCompletion::Superseded(first)));
    assert!(done.contains(&CaptureCompletion::Applied(second)));

    let latest = editor.generated_image().expect("generated image").clone();

    // a fresh capture of the same fields yields an equivalent image
    let mut other = PostEditor::new(config()).await.expect("editor");
    other.set_title("Second");
    other.generate_preview_image();
    other.settle().await;
    assert_eq!(other.generated_image().unwrap().fingerprint, latest.fingerprint);
    assert_eq!(editor.head().meta_property(OG_IMAGE), Some(latest.data_uri.as_str()));
}

#[tokio::test]
async fn recapture_reflects_edits() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.set_title("Before");
    editor.generate_preview_image();
    editor.settle().await;
    let before = editor.generated_image().unwrap().fingerprint.clone();

    editor.generate_preview_image();
    editor.settle().await;
    assert_eq!(editor.generated_image().unwrap().fingerprint, before);

    editor.set_title("After");
    editor.generate_preview_image();
    editor.settle().await;
    assert_ne!(editor.generated_image().unwrap().fingerprint, before);
}

#[cfg(feature = "http")]
#[tokio::test]
async fn cross_origin_image_without_cors_fails_and_keeps_state() {
    use tiny_http::{Response, Server};

    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();
        let png = png.into_inner();
        for request in server.incoming_requests() {
            let response = Response::from_data(png.clone())
                .with_header("Content-Type: image/png".parse::<tiny_http::Header>().unwrap());
            let _ = request.respond(response);
        }
    });

    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.set_title("Good");
    editor.generate_preview_image();
    editor.settle().await;
    let good = editor.generated_image().cloned().expect("first capture");

    editor.set_image_url(format!("http://{}/photo.png", addr));
    let ticket = editor.generate_preview_image();
    match editor.next_completion().await {
        Some(CaptureCompletion::Failed(t, message)) => {
            assert_eq!(t, ticket);
            assert!(!message.is_empty());
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert_eq!(editor.generated_image(), Some(&good));
    assert_eq!(editor.head().meta_property(OG_IMAGE), Some(good.data_uri.as_str()));
    assert!(editor.last_error().is_some());
}

#[tokio::test]
async fn failure_before_any_capture_leaves_head_empty() {
    let mut editor = PostEditor::new(config()).await.expect("editor");
    editor.unmount();
    editor.generate_preview_image();
    let done = editor.settle().await;
    assert!(matches!(done.as_slice(), [CaptureCompletion::Failed(..)]));
    assert!(editor.generated_image().is_none());
    assert!(editor.head().meta_property(OG_IMAGE).is_none());
    editor.shutdown().await.expect("shutdown");
}
