use espfs_lib::linker_script::{Framework, LinkerScriptParser};
use espfs_lib::resolver::resolve_linker_script;
use espfs_lib::{Error, LinkerScriptSource};

fn fixture_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn source(text: &str, framework: Framework) -> LinkerScriptSource {
    LinkerScriptSource {
        path: "eagle.app.v6.ld".to_string(),
        text: text.to_string(),
        framework,
        filesystem: "littlefs".to_string(),
    }
}

const MINIMAL: &str = "\
PROVIDE ( _FS_start = 0x40201000 );
PROVIDE ( _FS_end = 0x40300000 );
PROVIDE ( _FS_page = 0x100 );
PROVIDE ( _FS_block = 0x1000 );
";

#[test]
fn test_parse_arduino_fixture() {
    let path = fixture_path("tests/fixtures/eagle.flash.4m2m.ld");
    let text = std::fs::read_to_string(&path).unwrap();
    let parser = LinkerScriptParser::new(Framework::Arduino).unwrap();
    let set = parser.parse(&path.to_string_lossy(), &text).unwrap();

    assert_eq!(set.get("start"), Some(0x4040_0000));
    assert_eq!(set.get("end"), Some(0x405F_A000));
    assert_eq!(set.get("page"), Some(0x100));
    assert_eq!(set.get("block"), Some(0x2000));
    // `_EEPROM_start` and the deprecated `_SPIFFS_*` aliases are not picked up
    assert_eq!(set.symbols.len(), 4);
    assert_eq!(set.app_size, Some(0xfeff0));
    assert_eq!(set.flash_size, Some(4 * 1024 * 1024));
}

#[test]
fn test_resolve_arduino_fixture() {
    let path = fixture_path("tests/fixtures/eagle.flash.4m2m.ld");
    let source = LinkerScriptSource::load(&path, Framework::Arduino, "littlefs").unwrap();
    let region = resolve_linker_script(&source).unwrap();

    assert_eq!(region.start_offset(), 0x200000);
    assert_eq!(region.length(), 0x1FA000);
    assert_eq!(region.page_size(), 0x100);
    assert_eq!(region.block_size(), 0x2000);
    assert_eq!(region.block_count(), 253);
}

#[test]
fn test_sdk_framework_uses_spiffs_symbols() {
    let path = fixture_path("tests/fixtures/eagle.flash.4m2m.ld");
    let source = LinkerScriptSource::load(&path, Framework::Sdk, "littlefs").unwrap();
    let region = resolve_linker_script(&source).unwrap();

    assert_eq!(region.start_offset(), 0x200000);
    assert_eq!(region.length(), 0x1FA000);
}

#[test]
fn test_translation_across_first_bound() {
    let region = resolve_linker_script(&source(MINIMAL, Framework::Arduino)).unwrap();

    // start < 0x40300000 keeps its low 20 bits; end == 0x40300000 takes the second rule
    assert_eq!(region.start_offset(), 0x1000);
    let end = (0x4030_0000u32 & 0xFF_FFFF) - 0x20_0000;
    assert_eq!(region.length(), end - 0x1000);
    assert_eq!(region.length() % 0x1000, 0);
    assert!(region.length() / 0x1000 >= 1);
}

#[test]
fn test_missing_end_symbol() {
    let text = MINIMAL.replace("PROVIDE ( _FS_end = 0x40300000 );\n", "");
    match resolve_linker_script(&source(&text, Framework::Arduino)) {
        Err(Error::MissingLinkerSymbol { missing }) => assert_eq!(missing, vec!["end"]),
        other => panic!("expected MissingLinkerSymbol, got {:?}", other),
    }
}

#[test]
fn test_missing_symbols_all_named() {
    match resolve_linker_script(&source(MINIMAL, Framework::Sdk)) {
        Err(e @ Error::MissingLinkerSymbol { .. }) => {
            assert_eq!(
                e.to_string(),
                "missing linker symbol(s): start, end, page, block"
            );
        }
        other => panic!("expected MissingLinkerSymbol, got {:?}", other),
    }
}

#[test]
fn test_unsupported_filesystem() {
    let mut source = source(MINIMAL, Framework::Arduino);
    source.filesystem = "spiffs".to_string();
    match resolve_linker_script(&source) {
        Err(Error::UnsupportedFilesystem(name)) => assert_eq!(name, "spiffs"),
        other => panic!("expected UnsupportedFilesystem, got {:?}", other),
    }
}

#[test]
fn test_comments_blank_lines_and_case() {
    let text = "\
/* PROVIDE ( _FS_start = 0x40500000 ); */

   provide(_fs_START=0x40400000);
PROVIDE ( _FS_end = 0x405FA000 );
PROVIDE ( _FS_PAGE = 0X100 );
PROVIDE ( _FS_block = 0x2000 );
";
    let parser = LinkerScriptParser::new(Framework::Arduino).unwrap();
    let set = parser.parse("eagle.app.v6.ld", text).unwrap();
    assert_eq!(set.get("start"), Some(0x4040_0000));
    assert_eq!(set.get("page"), Some(0x100));
    assert_eq!(set.flash_size, None);
    assert_eq!(set.app_size, None);
}

#[test]
fn test_order_independent_and_last_app_size_wins() {
    let text = "\
PROVIDE ( _FS_block = 0x1000 );
  irom0_0_seg : org = 0x40201010, len = 0x10000
PROVIDE ( _FS_end = 0x40300000 );
  irom0_0_seg : org = 0x40201010, len = 0xfeff0
PROVIDE ( _FS_page = 0x100 );
PROVIDE ( _FS_start = 0x40201000 );
";
    let parser = LinkerScriptParser::new(Framework::Arduino).unwrap();
    let shuffled = parser.parse("eagle.flash.1m64.ld", text).unwrap();
    let ordered = parser.parse("eagle.flash.1m64.ld", MINIMAL).unwrap();

    assert_eq!(shuffled.symbols, ordered.symbols);
    assert_eq!(shuffled.app_size, Some(0xfeff0));
    assert_eq!(shuffled.flash_size, Some(1024 * 1024));
}

#[test]
fn test_end_before_start_is_rejected() {
    let text = "\
PROVIDE ( _FS_start = 0x40400000 );
PROVIDE ( _FS_end = 0x40300000 );
PROVIDE ( _FS_page = 0x100 );
PROVIDE ( _FS_block = 0x1000 );
";
    assert!(matches!(
        resolve_linker_script(&source(text, Framework::Arduino)),
        Err(Error::RegionInvariantViolation(_))
    ));
}

#[test]
fn test_oversized_value_is_rejected() {
    let text = MINIMAL.replace("0x40201000", "0x140201000");
    assert!(matches!(
        resolve_linker_script(&source(&text, Framework::Arduino)),
        Err(Error::InvalidSize(_))
    ));
}
