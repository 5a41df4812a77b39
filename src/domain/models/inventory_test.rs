use anyhow::Result;
use test_utils::fixture_path;

use super::Inventory;
use crate::domain::models::FileHandle;
use crate::domain::models::SessionStatus;
use crate::domain::models::UploadedFile;

fn to_string(inventory: &Inventory) -> String {
    return inventory
        .lines()
        .iter()
        .map(|line| {
            return line
                .spans
                .iter()
                .map(|span| return span.content.to_string())
                .collect::<Vec<String>>()
                .join("");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

#[test]
fn it_shows_an_empty_session() {
    let inventory = Inventory {
        status: SessionStatus::Initializing,
        clearing: false,
        uploaded: &[],
        pending: &[],
        uploading: false,
    };

    insta::assert_snapshot!(to_string(&inventory), @r###"
    Session initializing

    Uploaded (0/5)
      (none)

    Selected
      (none)
    "###);
}

#[test]
fn it_shows_uploads_and_selection() -> Result<()> {
    let uploaded = UploadedFile::from_names(vec!["x.pdf".to_string(), "y.pdf".to_string()]);
    let pending = vec![FileHandle::from_path(&fixture_path("alpha.txt"))?];
    let inventory = Inventory {
        status: SessionStatus::Active,
        clearing: false,
        uploaded: &uploaded,
        pending: &pending,
        uploading: true,
    };

    insta::assert_snapshot!(to_string(&inventory), @r###"
    Session active

    Uploaded (2/5)
    - x.pdf
    - y.pdf

    Selected
    - alpha.txt

    Uploading...
    "###);

    return Ok(());
}

#[test]
fn it_shows_a_session_being_cleared() {
    let uploaded = UploadedFile::from_names(vec!["x.pdf".to_string()]);
    let inventory = Inventory {
        status: SessionStatus::Active,
        clearing: true,
        uploaded: &uploaded,
        pending: &[],
        uploading: false,
    };

    let lines = to_string(&inventory);
    assert!(lines.starts_with("Session clearing\n"));
}
