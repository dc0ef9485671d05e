mod common;

use std::cell::RefCell;
use std::rc::Rc;

use page_recon::model::PageMeta;
use page_recon::viewport::{FitMode, MAX_SCALE, MIN_SCALE, PageNumbering, Viewport};

use common::{assert_close, page};

fn pages(numbers: impl IntoIterator<Item = i64>) -> Vec<PageMeta> {
    numbers.into_iter().map(|n| page(n, 600.0, 800.0)).collect()
}

#[test]
fn one_based_numbering_round_trips() {
    let numbering = PageNumbering::new(&pages(1..=5));
    assert!(!numbering.is_zero_based());
    assert_eq!(numbering.base(), 1);
    for p in 1..=5 {
        let internal = numbering.external_to_internal(p).expect("mapped");
        assert_eq!(internal, (p - 1) as usize);
        assert_eq!(numbering.internal_to_external(internal), Some(p));
    }
}

#[test]
fn zero_based_numbering_round_trips() {
    let numbering = PageNumbering::new(&pages(0..5));
    for p in 0..5 {
        let internal = numbering.external_to_internal(p).expect("mapped");
        assert_eq!(internal, p as usize);
        assert_eq!(numbering.internal_to_external(internal), Some(p));
    }
}

#[test]
fn zero_basing_is_detected_from_page_zero_without_page_one() {
    let single = PageNumbering::new(&pages([0]));
    assert!(single.is_zero_based());
    assert_eq!(single.base(), 0);
    let gapped = PageNumbering::new(&pages([0, 2, 3]));
    assert!(gapped.is_zero_based());
    assert!(!PageNumbering::new(&pages([1, 2])).is_zero_based());
}

#[test]
fn out_of_range_pages_clamp() {
    let numbering = PageNumbering::new(&pages(1..=5));
    assert_eq!(numbering.external_to_internal(0), Some(0));
    assert_eq!(numbering.external_to_internal(-3), Some(0));
    assert_eq!(numbering.external_to_internal(99), Some(4));
    assert_eq!(numbering.internal_to_external(99), Some(5));

    let sparse = PageNumbering::new(&pages([1, 4, 6]));
    assert_eq!(sparse.external_to_internal(2), Some(0));
    assert_eq!(sparse.external_to_internal(3), Some(1));
    assert_eq!(sparse.external_to_internal(5), Some(1));

    let empty = PageNumbering::new(&[]);
    assert!(empty.is_empty());
    assert_eq!(empty.external_to_internal(1), None);
    assert_eq!(empty.internal_to_external(0), None);
}

#[test]
fn zoom_steps_and_clamps() {
    let mut vp = Viewport::new(&pages(1..=2));
    assert_eq!(vp.scale(), 1.0);
    vp.zoom_in();
    assert_close(vp.scale(), 1.1, "scale");
    for _ in 0..30 {
        vp.zoom_in();
    }
    assert_eq!(vp.scale(), MAX_SCALE);
    for _ in 0..40 {
        vp.zoom_out();
    }
    assert_eq!(vp.scale(), MIN_SCALE);
    vp.set_scale(f64::NAN);
    assert_eq!(vp.scale(), 1.0);
}

#[test]
fn infinite_scales_clamp_to_the_bounds() {
    let mut vp = Viewport::new(&pages(1..=1));
    vp.set_scale(f64::INFINITY);
    assert_eq!(vp.scale(), MAX_SCALE);
    vp.set_scale(f64::NEG_INFINITY);
    assert_eq!(vp.scale(), MIN_SCALE);
    vp.set_scale(f64::MAX);
    assert_eq!(vp.scale(), MAX_SCALE);

    vp.set_fit_mode(FitMode::Width);
    vp.set_container_size(f64::INFINITY, 800.0);
    assert_eq!(vp.scale(), MAX_SCALE);
    assert_eq!(vp.fit_mode(), FitMode::Width);
}

#[test]
fn fit_modes_follow_container_and_page() {
    common::init_logging();
    let mut vp = Viewport::new(&[page(1, 600.0, 800.0), page(2, 800.0, 600.0)]);
    vp.set_container_size(1200.0, 960.0);

    vp.set_fit_mode(FitMode::Width);
    assert_close(vp.scale(), 2.0, "fit width, portrait");
    vp.next_page();
    assert_close(vp.scale(), 1.5, "fit width, landscape");

    vp.set_fit_mode(FitMode::Page);
    assert_close(vp.scale(), 1.5, "fit page, landscape");
    vp.prev_page();
    assert_close(vp.scale(), 1.2, "fit page, portrait");

    vp.set_container_size(300.0, 400.0);
    assert_close(vp.scale(), 0.5, "fit page after resize");
}

#[test]
fn manual_zoom_leaves_fit_mode() {
    let mut vp = Viewport::new(&pages(1..=1));
    vp.set_container_size(1200.0, 1600.0);
    vp.set_fit_mode(FitMode::Width);
    assert_eq!(vp.fit_mode(), FitMode::Width);
    vp.zoom_in();
    assert_eq!(vp.fit_mode(), FitMode::None);
    assert_close(vp.scale(), 2.1, "scale");

    vp.set_container_size(600.0, 800.0);
    assert_close(vp.scale(), 2.1, "no refit without a fit mode");
}

#[test]
fn navigation_notifies_in_external_numbers() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut vp = Viewport::new(&pages(0..3));
    let sink = Rc::clone(&seen);
    vp.on_page_change(move |p| sink.borrow_mut().push(p));

    assert_eq!(vp.current_page(), Some(0));
    assert_eq!(vp.prev_page(), Some(0));
    assert_eq!(vp.go_to_page(2), Some(2));
    assert_eq!(vp.go_to_page(2), Some(2));
    assert_eq!(vp.go_to_page(50), Some(2));
    assert_eq!(vp.prev_page(), Some(1));
    vp.sync_external_page(0);
    assert_eq!(vp.current_page(), Some(0));
    assert_eq!(vp.next_page(), Some(1));

    assert_eq!(*seen.borrow(), vec![2, 1, 1]);
    assert_eq!(vp.state().external_current_page, 1);
}

#[test]
fn replacing_pages_keeps_or_clamps_the_current_page() {
    let mut vp = Viewport::new(&pages(1..=5));
    vp.go_to_page(3);
    vp.set_pages(&pages(1..=4));
    assert_eq!(vp.current_page(), Some(3));
    vp.set_pages(&pages(1..=2));
    assert_eq!(vp.current_page(), Some(2));
    assert_eq!(vp.current_page_size(), Some((600.0, 800.0)));
}
