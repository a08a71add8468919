use super::*;
use crate::eval::mix::MixMode;
use crate::expression::value::Value;

fn minimal() -> serde_json::Value {
    serde_json::json!({
        "graph": { "scenes": { "root": {} } },
        "shared_data": {},
        "setup": {}
    })
}

#[test]
fn setup_fields_fall_back_individually() {
    let mut doc = minimal();
    doc["setup"] = serde_json::json!({ "max_draw_depth": 2, "root": "main" });
    let doc = SceneDocument::from_json(&doc).unwrap();

    assert_eq!(doc.setup.max_draw_depth, 2);
    assert_eq!(doc.setup.root, "main");
    assert_eq!(doc.setup.background_color, [0.2, 0.3, 0.3]);
    assert_eq!(doc.setup.frame_rate, 30.0);
    assert!(!doc.setup.reject_cycles);
}

#[test]
fn top_level_sections_are_required() {
    for key in ["graph", "shared_data", "setup"] {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove(key);
        let err = SceneDocument::from_json(&doc).unwrap_err();
        assert!(matches!(err, ShapeError::Document(_)), "{key}: {err}");
        assert!(err.to_string().contains(key), "{err}");
    }
}

#[test]
fn maps_default_to_empty_overrides() {
    let doc = SceneDocument::from_json(&minimal()).unwrap();
    assert_eq!(doc.maps, Maps::default());
    assert_eq!(doc.maps.mix, MixPolicy::empty());
}

#[test]
fn maps_parse_aliases_and_mix_entries() {
    let mut doc = minimal();
    doc["maps"] = serde_json::json!({
        "opcodes": { "wave": "fsine" },
        "mix": { "color": "mult", "size_x": "add" },
        "kinds": { "quad": "rect" }
    });
    let doc = SceneDocument::from_json(&doc).unwrap();

    assert_eq!(doc.maps.opcodes["wave"], "fsine");
    assert_eq!(doc.maps.kinds["quad"], "rect");
    assert_eq!(doc.maps.mix.mode("color"), MixMode::Multiply);
    assert_eq!(doc.maps.mix.mode("size_x"), MixMode::Add);
}

#[test]
fn object_attributes_sit_beside_the_type() {
    let doc = serde_json::json!({
        "graph": {
            "scenes": { "root": { "objects": ["a"], "self": { "pos_x": 0.5 } } },
            "objects": { "a": { "type": "rect", "size_x": ["fsine", 0.1, 0.5] } }
        },
        "shared_data": { "palette": { "red": [1, 0, 0] } },
        "setup": {}
    });
    let doc = SceneDocument::from_json(&doc).unwrap();

    let obj = &doc.graph.objects["a"];
    assert_eq!(obj.kind, "rect");
    assert_eq!(obj.attrs.len(), 1);
    assert_eq!(obj.attrs["size_x"], serde_json::json!(["fsine", 0.1, 0.5]));

    let root = &doc.graph.scenes["root"];
    assert_eq!(root.objects, ["a"]);
    assert!(root.scenes.is_empty());
    assert_eq!(root.attrs["pos_x"], serde_json::json!(0.5));

    let red = doc.shared_data.lookup("palette", "red").unwrap();
    assert_eq!(
        red,
        &Value::List(vec![1.0.into(), 0.0.into(), 0.0.into()])
    );
}

#[test]
fn object_without_type_is_rejected() {
    let mut doc = minimal();
    doc["graph"]["objects"] = serde_json::json!({ "a": { "size_x": 1 } });
    assert!(SceneDocument::from_json(&doc).is_err());
}
