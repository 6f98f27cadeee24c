use espfs_lib::address;
use espfs_lib::utils::Utils;
use espfs_lib::Error;

#[derive(Debug, serde::Deserialize)]
struct AddressCase {
    name: String,
    address: String,
    /// `None` when the address has no valid flash offset
    offset: Option<String>,
}

fn fixture_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn load_cases() -> Vec<AddressCase> {
    let path = fixture_path("tests/address_cases.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("failed to read {}", path.display()));
    serde_json::from_str(&json).expect("failed to parse address cases JSON")
}

#[test]
fn address_translation_matches_cases() {
    let cases = load_cases();
    assert!(!cases.is_empty());

    for case in cases {
        let address = Utils::parse_size(case.address.as_str()).unwrap();
        let result = address::translate(address);
        match case.offset {
            Some(ref offset) => {
                let expected = Utils::parse_size(offset.as_str()).unwrap();
                let actual = result
                    .unwrap_or_else(|e| panic!("case '{}' failed: {}", case.name, e));
                assert_eq!(actual, expected, "case '{}'", case.name);
            }
            None => {
                assert!(
                    matches!(result, Err(Error::RegionInvariantViolation(_))),
                    "case '{}' should not translate, got {:?}",
                    case.name,
                    result
                );
            }
        }
    }
}

#[test]
fn rules_are_ordered_by_upper_bound() {
    let bounds: Vec<u32> = address::ADDRESS_RANGE_RULES
        .iter()
        .map_while(|rule| rule.upper_bound)
        .collect();
    assert_eq!(bounds, vec![0x4030_0000, 0x411F_B000]);
    assert!(bounds.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(address::ADDRESS_RANGE_RULES.last().unwrap().upper_bound.is_none());
}
