//! Process backend tests against a fake `grit` shell script.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use gfxbake::asset::{bmp, Color};
use gfxbake::build::{BuildContext, BuildPipeline, NullProgress};
use gfxbake::codec::{CodecBackend, CodecError, CodecRequest, ColorRequest, GraphicsRequest, GritBackend, MapRequest};
use gfxbake::config::GfxbakeConfig;
use gfxbake::item::{Bpp, Compression, Encodings, Field};

/// Records its arguments next to the stem and writes a minimal report.
const FAKE_GRIT: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    -o*) stem="${arg#-o}" ;;
  esac
done
echo "$@" >> "$stem.args"
printf '//\t+ 4 tiles not compressed\n//\tTotal size: 32 + 128 = 160\n\nextern const unsigned int x_bn_gfxTiles[32];\n' > "$stem.h"
printf '@ data\n' > "$stem.s"
"#;

const FAILING_GRIT: &str = "#!/bin/sh\necho 'unknown option' >&2\nexit 3\n";

const SILENT_GRIT: &str = "#!/bin/sh\nexit 0\n";

fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

fn request(dir: &Path) -> CodecRequest {
    CodecRequest {
        source: dir.join("ship.bmp"),
        stem: dir.join("ship_bn_gfx"),
        graphics: GraphicsRequest::Tiles(Bpp::Four),
        colors: ColorRequest::Count(16),
        map: MapRequest::None,
        encodings: Encodings::only(Field::Tiles, Compression::Lz77),
    }
}

#[test]
fn test_report_is_parsed_and_removed() {
    let temp = TempDir::new().unwrap();
    let grit = install_script(temp.path(), "grit", FAKE_GRIT);
    let backend = GritBackend::new(grit);
    let request = request(temp.path());

    let report = backend.invoke(&request).unwrap();
    assert_eq!(report.total_size, 160);
    assert_eq!(report.tiles_count, Some(4));

    assert!(!request.report_path().exists());
    assert!(temp.path().join("ship_bn_gfx.s").exists());

    let args = fs::read_to_string(temp.path().join("ship_bn_gfx.args")).unwrap();
    assert_eq!(args.trim(), request.args().join(" "));
}

#[test]
fn test_nonzero_exit_carries_output() {
    let temp = TempDir::new().unwrap();
    let grit = install_script(temp.path(), "grit", FAILING_GRIT);
    let err = GritBackend::new(grit).invoke(&request(temp.path())).unwrap_err();

    match &err {
        CodecError::Failed { status, output } => {
            assert_eq!(*status, Some(3));
            assert_eq!(output, "unknown option");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_missing_report() {
    let temp = TempDir::new().unwrap();
    let grit = install_script(temp.path(), "grit", SILENT_GRIT);
    let err = GritBackend::new(grit).invoke(&request(temp.path())).unwrap_err();
    assert!(matches!(err, CodecError::MissingReport { .. }));
}

#[test]
fn test_stale_report_is_not_reused() {
    let temp = TempDir::new().unwrap();
    let request = request(temp.path());
    fs::write(request.report_path(), "//\tTotal size: 1\n").unwrap();

    let grit = install_script(temp.path(), "grit", SILENT_GRIT);
    let err = GritBackend::new(grit).invoke(&request).unwrap_err();
    assert!(matches!(err, CodecError::MissingReport { .. }));
}

#[test]
fn test_pipeline_with_process_backend() {
    let temp = TempDir::new().unwrap();
    let graphics = temp.path().join("graphics");
    let palette: Vec<Color> = (0..16).map(|i| Color::rgb(i * 16, i * 8, i * 4)).collect();
    let indices: Vec<u8> = (0..256).map(|i| (i % 16) as u8).collect();
    bmp::write_indexed(&graphics.join("ship.bmp"), 16, 16, 4, &palette, &indices).unwrap();
    fs::write(graphics.join("ship.json"), r#"{"type": "sprite", "height": 16, "tiles_compression": "auto"}"#).unwrap();

    let grit = install_script(temp.path(), "grit", FAKE_GRIT);
    let backend = GritBackend::new(grit);
    let reporter = NullProgress::new();
    let context = BuildContext::new(GfxbakeConfig::default(), temp.path().to_path_buf());
    let result = BuildPipeline::new(context, &backend, &reporter).build().unwrap();

    assert!(result.is_success(), "{}", result.summary());
    let build = temp.path().join("build");
    assert!(build.join("bn_sprite_items_ship.h").exists());
    assert!(build.join("_bn_ship_file_info.txt").exists());
    assert!(!build.join("ship_bn_gfx.h").exists());

    // Three tiles trials plus the final invocation
    let args = fs::read_to_string(build.join("ship_bn_gfx.args")).unwrap();
    assert_eq!(args.lines().count(), 4);
}
