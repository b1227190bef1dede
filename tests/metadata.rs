//! Stream metadata extraction and open-time validation.

mod common;

use common::{GifBuilder, PALETTE};
use gif_player::io::MemorySource;
use gif_player::{Error, Player};

#[test]
fn screen_geometry_and_frame_count() {
    let bytes = GifBuilder::new(320, 200, &PALETTE, 1)
        .control(1, 10, None)
        .frame(0, 0, 320, 200, &vec![0; 320 * 200])
        .control(1, 10, None)
        .frame(10, 20, 30, 40, &vec![1; 30 * 40])
        .build();
    let player = Player::open_metadata_only(MemorySource::new(bytes)).unwrap();

    assert_eq!(player.width(), 320);
    assert_eq!(player.height(), 200);
    assert_eq!(player.frame_count(), 2);
    assert_eq!(player.buffer_size(), 320 * 200 * 4);
    assert_eq!(player.loop_count(), 0);
    assert_eq!(player.comment(), "");
}

#[test]
fn total_duration_sums_normalized_delays() {
    // a raw delay of 0 normalizes to 100 ms, 25 centiseconds to 250 ms
    let bytes = GifBuilder::new(1, 1, &PALETTE, 0)
        .control(1, 0, None)
        .frame(0, 0, 1, 1, &[0])
        .control(1, 25, None)
        .frame(0, 0, 1, 1, &[1])
        .build();
    let player = Player::open_metadata_only(MemorySource::new(bytes)).unwrap();
    assert_eq!(player.total_duration(), 350);
}

#[test]
fn comment_sub_blocks_concatenate() {
    let bytes = GifBuilder::new(1, 1, &PALETTE, 0)
        .comment_blocks(&[b"hello", b" ho"])
        .control(1, 10, None)
        .frame(0, 0, 1, 1, &[0])
        .build();
    let player = Player::open_metadata_only(MemorySource::new(bytes)).unwrap();
    assert_eq!(player.comment(), "hello ho");
    assert_eq!(player.comment().len(), 8);
}

#[test]
fn netscape_extension_sets_the_loop_count() {
    let bytes = GifBuilder::new(1, 1, &PALETTE, 0)
        .loop_count(5)
        .control(1, 10, None)
        .frame(0, 0, 1, 1, &[0])
        .build();
    let player = Player::open_metadata_only(MemorySource::new(bytes)).unwrap();
    assert_eq!(player.loop_count(), 5);
}

#[test]
fn non_gif_bytes_fail_to_open() {
    let err = Player::from_bytes(b"not a gif at all".to_vec()).unwrap_err();
    assert_eq!(err, Error::OpenFailed);

    // GIF magic with an unknown version byte
    let err = Player::from_bytes(b"GIF99a\0\0\0\0\0\0\0".to_vec()).unwrap_err();
    assert_eq!(err, Error::OpenFailed);
}

#[test]
fn a_stream_without_frames_is_rejected() {
    let bytes = GifBuilder::new(4, 4, &PALETTE, 0).build();
    let err = Player::from_bytes(bytes).unwrap_err();
    assert_eq!(err, Error::NoFrames);
}

#[test]
fn zero_screen_dimensions_are_rejected() {
    let bytes = GifBuilder::new(0, 4, &PALETTE, 0)
        .frame(0, 0, 1, 1, &[0])
        .build();
    let err = Player::from_bytes(bytes).unwrap_err();
    assert_eq!(err, Error::InvalidScreenDimensions);
}

#[test]
fn a_frame_escaping_the_canvas_is_rejected() {
    let bytes = GifBuilder::new(2, 2, &PALETTE, 0)
        .control(1, 10, None)
        .frame(1, 0, 2, 2, &[0; 4])
        .build();
    let err = Player::from_bytes(bytes).unwrap_err();
    assert_eq!(err, Error::ImageNotConfined);
}

#[test]
fn open_file_reads_from_the_filesystem() {
    let bytes = GifBuilder::new(3, 5, &PALETTE, 0)
        .control(1, 10, None)
        .frame(0, 0, 3, 5, &[0; 15])
        .build();
    let path = std::env::temp_dir().join("gif-player-open-file-test.gif");
    std::fs::write(&path, &bytes).unwrap();

    let player = Player::open_file(&path).unwrap();
    assert_eq!((player.width(), player.height()), (3, 5));
    assert_eq!(player.frame_count(), 1);

    drop(player);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_reports_open_failed() {
    let err = Player::open_file("/nonexistent/definitely-not-here.gif").unwrap_err();
    assert_eq!(err, Error::OpenFailed);
}

#[test]
fn into_inner_returns_the_source() {
    let bytes = GifBuilder::new(1, 1, &PALETTE, 0)
        .control(1, 10, None)
        .frame(0, 0, 1, 1, &[0])
        .build();
    let player = Player::from_bytes(bytes.clone()).unwrap();
    let source = player.into_inner();
    assert_eq!(source.into_inner(), bytes);
}
