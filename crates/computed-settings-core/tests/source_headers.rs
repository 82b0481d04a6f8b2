//! Every module of this crate except `lib.rs` opens with the same header.

use std::path::Path;

#[test]
fn test_modules_carry_file_header() {
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut checked = 0;
    for entry in std::fs::read_dir(&src).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        if !name.ends_with(".rs") || name == "lib.rs" {
            continue;
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let expected = format!("/*\n * {name}\n * Copyright (c) ");
        assert!(text.starts_with(&expected), "{name} has no file header");
        assert!(text.contains("\n */\n\n//! "), "{name} header is not followed by docs");
        checked += 1;
    }
    assert!(checked >= 9);
}
