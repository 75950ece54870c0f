use image::{ImageOutputFormat, Rgb, RgbImage};
use pulsetab::engine::FrameSource;
use pulsetab::ingest::DirectorySource;
use std::io::Cursor;

fn write_frame(dir: &std::path::Path, name: &str, green: u8) {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(4, 4, Rgb([0, green, 0]))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    std::fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn test_frames_replay_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "frame_002.png", 2);
    write_frame(dir.path(), "frame_000.png", 0);
    write_frame(dir.path(), "frame_001.png", 1);
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let mut source = DirectorySource::open(dir.path()).unwrap();
    assert_eq!(source.len(), 3);

    let frames: Vec<Vec<u8>> = tokio_test::block_on(async {
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame().await {
            frames.push(frame);
        }
        frames
    });
    assert_eq!(frames.len(), 3);

    let greens: Vec<u8> = frames
        .iter()
        .map(|f| image::load_from_memory(f).unwrap().to_rgb8().get_pixel(0, 0)[1])
        .collect();
    assert_eq!(greens, vec![0, 1, 2]);
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = DirectorySource::open(dir.path()).unwrap();
    assert!(source.is_empty());
    assert!(tokio_test::block_on(source.next_frame()).is_none());
}

#[test]
fn test_missing_directory_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DirectorySource::open(dir.path().join("absent")).is_err());
}
