use mosaiq::{LayoutKind, MaskShape, Scene, StrokeTool};

#[test]
fn json_fixture_validates() {
    let s = include_str!("data/collage_scene.json");
    let scene: Scene = serde_json::from_str(s).unwrap();
    scene.validate().unwrap();

    assert_eq!(scene.layout, LayoutKind::Grid);
    assert_eq!(scene.images.len(), 4);
    assert_eq!(scene.strokes[0].tool, StrokeTool::Highlighter);
    assert_eq!(
        scene.image_settings.get(&2).unwrap().mask.unwrap().shape,
        MaskShape::Circle
    );
    assert!(scene.effects.duotone.is_some());
    assert!(scene.effects.shadow.is_none());
}

#[test]
fn json_round_trip_preserves_scene() {
    let s = include_str!("data/collage_scene.json");
    let scene: Scene = serde_json::from_str(s).unwrap();
    let re = serde_json::to_string(&scene).unwrap();
    let back: Scene = serde_json::from_str(&re).unwrap();
    back.validate().unwrap();
    assert_eq!(back.images.len(), scene.images.len());
    assert_eq!(back.seed, scene.seed);
    assert_eq!(back.filters, scene.filters);
}

#[test]
fn forward_incompatible_enums_still_parse() {
    let s = include_str!("data/collage_scene.json")
        .replace("\"Grid\"", "\"HexSpiral\"")
        .replace("\"Circle\"", "\"Squircle\"");
    let scene: Scene = serde_json::from_str(&s).unwrap();
    scene.validate().unwrap();
    assert_eq!(scene.layout, LayoutKind::Unknown);
    assert_eq!(
        scene.image_settings.get(&2).unwrap().mask.unwrap().shape,
        MaskShape::Unknown
    );
}

#[test]
fn out_of_bounds_crop_fails_validation() {
    let s = include_str!("data/collage_scene.json").replace(
        "\"crop\": { \"x\": 10, \"y\": 10, \"width\": 80, \"height\": 80 }",
        "\"crop\": { \"x\": 40, \"y\": 10, \"width\": 80, \"height\": 80 }",
    );
    let scene: Scene = serde_json::from_str(&s).unwrap();
    let err = scene.validate().unwrap_err();
    assert!(err.to_string().contains("crop"));
}
