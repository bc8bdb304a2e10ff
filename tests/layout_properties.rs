use mosaiq::{Canvas, LayoutKind, Slot, compute_layout};

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas { width: w, height: h }
}

fn sizes(n: usize) -> Vec<(u32, u32)> {
    vec![(800, 600); n]
}

/// Layouts with a fixed slot table place at most 8 images; everything else
/// places one slot per image.
#[test]
fn slot_count_is_min_of_images_and_capacity() {
    let table_layouts = [
        LayoutKind::Mosaic,
        LayoutKind::Collage1,
        LayoutKind::Collage2,
        LayoutKind::Overlay,
    ];
    for layout in table_layouts {
        for n in 1..=12 {
            let slots = compute_layout(layout, canvas(800, 800), &sizes(n), 0.0).unwrap();
            assert_eq!(slots.len(), n.min(8), "{layout:?} with {n} images");
        }
    }

    for layout in [LayoutKind::Horizontal, LayoutKind::Vertical] {
        for n in 1..=12 {
            let slots = compute_layout(layout, canvas(2000, 2000), &sizes(n), 4.0).unwrap();
            assert_eq!(slots.len(), n, "{layout:?} with {n} images");
        }
    }
}

#[test]
fn minimum_image_counts_are_enforced_per_layout() {
    let cases = [
        (LayoutKind::Grid, 2),
        (LayoutKind::Diagonal, 2),
        (LayoutKind::Stacked, 2),
        (LayoutKind::Circular, 3),
    ];
    for (layout, min) in cases {
        let below = compute_layout(layout, canvas(600, 600), &sizes(min - 1), 0.0);
        assert!(below.is_err(), "{layout:?} accepted {} images", min - 1);
        let at = compute_layout(layout, canvas(600, 600), &sizes(min), 0.0);
        assert!(at.is_ok(), "{layout:?} rejected {min} images");
    }
}

#[test]
fn grid_four_images_on_square_canvas_worked_example() {
    let slots = compute_layout(LayoutKind::Grid, canvas(1200, 1200), &sizes(4), 20.0).unwrap();
    let cell = (1200.0 - 20.0 * 3.0) / 2.0;
    let origins: Vec<(f64, f64)> = slots.iter().map(|s| (s.rect.x0, s.rect.y0)).collect();
    assert_eq!(
        origins,
        vec![
            (20.0, 20.0),
            (20.0 + cell + 20.0, 20.0),
            (20.0, 20.0 + cell + 20.0),
            (20.0 + cell + 20.0, 20.0 + cell + 20.0),
        ]
    );
    for slot in &slots {
        assert!((slot.rect.width() - cell).abs() < 1e-9);
        assert!((slot.rect.height() - cell).abs() < 1e-9);
    }
}

#[test]
fn cell_layouts_use_equal_cells_with_uniform_gaps() {
    for n in 2..=6 {
        let slots =
            compute_layout(LayoutKind::Horizontal, canvas(1300, 400), &sizes(n), 10.0).unwrap();
        let w0 = slots[0].rect.width();
        for pair in slots.windows(2) {
            assert!((pair[1].rect.width() - w0).abs() < 1e-9);
            let gap = pair[1].rect.x0 - pair[0].rect.x1;
            assert!((gap - 10.0).abs() < 1e-9, "gap {gap} with {n} images");
        }
        assert!((slots[0].rect.x0 - 10.0).abs() < 1e-9);
        assert!((slots[n - 1].rect.x1 - (1300.0 - 10.0)).abs() < 1e-9);
    }
}

#[test]
fn stacked_layout_fans_rotations_in_twelve_degree_steps() {
    let slots = compute_layout(LayoutKind::Stacked, canvas(1000, 1000), &sizes(3), 0.0).unwrap();
    let rotations: Vec<f64> = slots.iter().map(|s| s.rotation_deg).collect();
    assert_eq!(rotations, vec![-12.0, 0.0, 12.0]);

    let slots = compute_layout(LayoutKind::Stacked, canvas(1000, 1000), &sizes(5), 0.0).unwrap();
    let rotations: Vec<f64> = slots.iter().map(|s| s.rotation_deg).collect();
    assert_eq!(rotations, vec![-24.0, -12.0, 0.0, 12.0, 24.0]);
}

#[test]
fn unrotated_layouts_keep_slots_inside_the_canvas() {
    let inside = |slot: &Slot, w: f64, h: f64| {
        slot.rect.x0 >= -1e-9
            && slot.rect.y0 >= -1e-9
            && slot.rect.x1 <= w + 1e-9
            && slot.rect.y1 <= h + 1e-9
    };
    for layout in [
        LayoutKind::Single,
        LayoutKind::Horizontal,
        LayoutKind::Vertical,
        LayoutKind::Grid,
        LayoutKind::Diagonal,
        LayoutKind::Circular,
        LayoutKind::Mosaic,
        LayoutKind::Collage2,
        LayoutKind::Overlay,
    ] {
        for n in 3..=8 {
            let slots = compute_layout(layout, canvas(1100, 900), &sizes(n), 12.0).unwrap();
            for slot in &slots {
                assert!(inside(slot, 1100.0, 900.0), "{layout:?} n={n} slot {slot:?}");
            }
        }
    }
}
