//! Round-Trip Tests
//!
//! Canonical text re-parses to equal policies and re-serializes byte-identically.
//! Declaration order of annotations, targets, fields and configs is kept.

use aeropolicy::manifest::Manifest;
use aeropolicy::schema::{FieldDef, FieldType, Schema, SchemaLoader};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_catalog() -> (TempDir, SchemaLoader) {
    let tmp = TempDir::new().unwrap();
    let mut loader = SchemaLoader::new(tmp.path());

    loader
        .register(Schema::new(
            "Address",
            vec![FieldDef::text("street"), FieldDef::text("city")],
        ))
        .unwrap();
    loader
        .register(Schema::new(
            "Person",
            vec![
                FieldDef::text("name"),
                FieldDef::text("phone"),
                FieldDef::new("address", FieldType::reference("Address")),
            ],
        ))
        .unwrap();

    (tmp, loader)
}

fn assert_round_trip(text: &str) {
    let (_tmp, loader) = setup_catalog();
    let first = Manifest::parse(text, &loader).unwrap();
    let printed = first.to_manifest_string();
    assert_eq!(printed, text);

    let second = Manifest::parse(&printed, &loader).unwrap();
    assert_eq!(second, first);
    assert_eq!(second.to_manifest_string(), printed);
}

// =============================================================================
// Canonical Layout Tests
// =============================================================================

#[test]
fn test_full_policy_round_trip() {
    assert_round_trip(
        "@intendedPurpose('Analytics on user\\'s location')
@egressType('Logging')
@owner('privacy-team')
policy Analytics {
  @allowedRetention(medium: 'Ram', encryption: false)
  @allowedRetention(medium: 'Disk', encryption: true)
  @maxAge('7d')
  @reviewed(by: 'alice', quarter: 3, final: true)
  from Person access {
    @allowedUsage(label: 'hashed', usageType: 'egress')
    @allowedUsage(label: '', usageType: 'join')
    name,
    address {
      @allowedUsage(label: 'truncated', usageType: '*')
      city,
      @sensitive
      street,
    },
  }
  from Address access {
    city,
  }
  config Storage {
    engine: 'sled'
    path: 'line one\\nline two'
  }
}
",
    );
}

#[test]
fn test_multiple_policies_round_trip() {
    assert_round_trip(
        "policy A {
  from Person access {
    phone,
  }
}

policy B {
  from Address access {
    street,
  }
}
",
    );
}

#[test]
fn test_empty_target_and_policy_round_trip() {
    assert_round_trip(
        "policy Empty {
}

policy NoFields {
  from Person access {
  }
}
",
    );
}

// =============================================================================
// Normalization Tests
// =============================================================================

#[test]
fn test_free_form_text_normalizes() {
    let (_tmp, loader) = setup_catalog();
    let messy = "// header comment
policy   P{from Person access{name,address{city}}  config C{k:'v', j: 'w',}}";

    let manifest = Manifest::parse(messy, &loader).unwrap();
    assert_eq!(
        manifest.to_manifest_string(),
        "policy P {
  from Person access {
    name,
    address {
      city,
    },
  }
  config C {
    k: 'v'
    j: 'w'
  }
}
"
    );
}

#[test]
fn test_defaults_are_not_printed() {
    let (_tmp, loader) = setup_catalog();
    let manifest = Manifest::parse(
        "policy P {
           @maxAge('0d')
           from Person access {
             @allowedUsage(label: '', usageType: '*')
             name
           }
         }",
        &loader,
    )
    .unwrap();

    let printed = manifest.to_manifest_string();
    assert!(!printed.contains("@maxAge"));
    assert!(!printed.contains("@allowedUsage"));
}

#[test]
fn test_positional_annotation_args_print_named() {
    let (_tmp, loader) = setup_catalog();
    let manifest = Manifest::parse(
        "policy P {
           @allowedRetention('Disk', true)
           from Person access {
             @allowedUsage('hashed', 'join')
             phone
           }
         }",
        &loader,
    )
    .unwrap();

    let target = manifest.policy("P").unwrap().targets[0].to_manifest_string();
    assert_eq!(
        target,
        "@allowedRetention(medium: 'Disk', encryption: true)
from Person access {
  @allowedUsage(label: 'hashed', usageType: 'join')
  phone,
}
"
    );
}

#[test]
fn test_field_subtree_serialization() {
    let (_tmp, loader) = setup_catalog();
    let manifest =
        Manifest::parse("policy P { from Person access { address { street } } }", &loader).unwrap();

    let address = manifest.policy("P").unwrap().targets[0].field("address").unwrap();
    assert_eq!(address.to_manifest_string(), "address {\n  street,\n},\n");
}

/// An empty subfield block is a bare selection and prints as one.
#[test]
fn test_empty_subfield_block_normalizes_to_leaf() {
    let (_tmp, loader) = setup_catalog();
    let braced = Manifest::parse("policy P { from Person access { address {}, name } }", &loader)
        .unwrap();
    let bare = Manifest::parse("policy P { from Person access { address, name } }", &loader)
        .unwrap();

    assert_eq!(braced, bare);
    let address = braced.policy("P").unwrap().targets[0].field("address").unwrap();
    assert!(address.is_leaf());
    assert_eq!(
        braced.to_manifest_string(),
        "policy P {
  from Person access {
    address,
    name,
  }
}
"
    );

    let schema = braced.policy("P").unwrap().targets[0]
        .get_max_read_schema(&loader)
        .unwrap();
    let nested = schema.field("address").unwrap().field_type.schema().unwrap();
    assert_eq!(nested.field_names(), vec!["street", "city"]);
}
