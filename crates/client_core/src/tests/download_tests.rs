use super::*;

use shared::{GenerationResult, MediaType, UploadedImage};

use crate::session::Session;

const AVATAR: &[u8] = b"\x89PNG\r\n\x1a\n\0\x01\x02avatar";
const BIO: &str = "Meet Curly, the bravest barista in Bubbleton.";

fn success_state() -> ViewState {
    let mut session = Session::new();
    session
        .begin(&UploadedImage::new("photo.png", MediaType::Png, b"\x89PNG\r\n\x1a\nphoto".to_vec()))
        .expect("begin");
    session.complete(Ok(GenerationResult::new(AVATAR.to_vec(), BIO)));
    session.state().clone()
}

#[test]
fn artifacts_exist_only_for_success() {
    assert!(DownloadArtifact::from_state(&ViewState::Idle, ArtifactKind::Image).is_none());
    let error = ViewState::Error {
        message: "boom".into(),
    };
    assert!(DownloadArtifact::from_state(&error, ArtifactKind::Bio).is_none());
}

#[test]
fn suggested_file_names_are_fixed() {
    let state = success_state();
    let image = DownloadArtifact::from_state(&state, ArtifactKind::Image).expect("image");
    let bio = DownloadArtifact::from_state(&state, ArtifactKind::Bio).expect("bio");

    assert_eq!(image.file_name(), "memoji.png");
    assert_eq!(bio.file_name(), "memoji-bio.txt");
}

#[test]
fn saved_avatar_is_byte_identical_to_the_generated_image() {
    let dir = tempfile::tempdir().expect("temp dir");
    let state = success_state();

    let path = DownloadArtifact::from_state(&state, ArtifactKind::Image)
        .expect("image")
        .save_to_dir(dir.path())
        .expect("save");

    assert_eq!(path, dir.path().join(AVATAR_FILE_NAME));
    assert_eq!(fs::read(&path).expect("read back"), AVATAR);
}

#[test]
fn saved_bio_is_the_plain_text_bio() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = DownloadArtifact::from_state(&success_state(), ArtifactKind::Bio)
        .expect("bio")
        .save_to_dir(&dir.path().join("nested"))
        .expect("save");

    assert_eq!(fs::read_to_string(path).expect("read back"), BIO);
}

#[test]
fn unwritable_target_reports_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = DownloadArtifact::from_state(&success_state(), ArtifactKind::Bio).expect("bio");

    let err = artifact
        .save_to(&dir.path().join("missing").join("memoji-bio.txt"))
        .expect_err("parent does not exist");
    assert!(err.to_string().contains("failed to write"));
}
