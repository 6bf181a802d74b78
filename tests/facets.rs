mod common;

use common::synthetic_image::{island_rgba, random_blocks_rgba, PALETTE6};
use pbn_facets::facets::{
    FacetGraph, FacetGraphBuilder, FacetReducer, FillScratch, NeighbourState, ReduceOptions,
    RemovalOrder,
};
use pbn_facets::image::{Grid, RgbaImage};
use pbn_facets::quantize::{ColorQuantizer, QuantizeOptions, Quantized};
use pbn_facets::RunContext;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn quantize(w: usize, h: usize, rgba: &[u8], k: usize) -> Quantized {
    let image = RgbaImage::new(w, h, rgba).expect("valid image");
    ColorQuantizer::new(QuantizeOptions {
        k,
        bits_to_chop: 0,
        ..Default::default()
    })
    .quantize(&image, &mut RunContext::default())
    .expect("quantized")
}

fn build(colors: &Grid<u8>, scratch: &mut FillScratch) -> FacetGraph {
    FacetGraphBuilder::build(colors, scratch, &mut RunContext::default()).expect("built")
}

#[test]
fn single_pixel_island_is_absorbed() {
    init_logging();
    let rgba = island_rgba(5, 5, 2, 2, 1);
    let Quantized {
        palette,
        mut color_indices,
        ..
    } = quantize(5, 5, &rgba, 2);
    assert_eq!(palette.len(), 2);

    let mut scratch = FillScratch::new(5, 5);
    let mut graph = build(&color_indices, &mut scratch);
    assert_eq!(graph.live_count(), 2);

    let reducer = FacetReducer::new(
        ReduceOptions {
            min_facet_size: 2,
            ..Default::default()
        },
        palette.distance_matrix(),
    );
    let stats = reducer
        .reduce(
            &mut graph,
            &mut color_indices,
            &mut scratch,
            &mut RunContext::default(),
        )
        .expect("reduced");
    assert_eq!(stats.deleted, 1);
    assert_eq!(graph.live_count(), 1);
    assert_eq!(graph.total_pixel_count(), 25);
    assert!(graph.is_partition());
    assert_eq!(color_indices.at(2, 2), color_indices.at(0, 0));
}

#[test]
fn builder_partitions_random_blocks() {
    init_logging();
    let (w, h) = (30usize, 20usize);
    let rgba = random_blocks_rgba(w, h, 2, &PALETTE6, 9);
    let q = quantize(w, h, &rgba, 6);
    let mut scratch = FillScratch::new(w, h);
    let mut graph = build(&q.color_indices, &mut scratch);

    assert!(graph.is_partition());
    assert_eq!(graph.total_pixel_count(), w * h);
    for id in graph.live_ids() {
        let facet = graph.facet(id).expect("live facet");
        assert_eq!(facet.neighbour_state(), NeighbourState::Stale);
        assert!(facet.border_points.len() <= facet.pixel_count);
        let neighbours = graph.neighbours(id).to_vec();
        assert!(neighbours.windows(2).all(|p| p[0] < p[1]), "sorted and distinct");
        let own = graph.facet(id).map(|f| f.color).expect("live facet");
        for n in neighbours {
            let other = graph.facet(n).map(|f| f.color).expect("neighbour is live");
            assert_ne!(own, other, "adjacent facets {id} and {n} share a colour");
        }
    }
}

#[test]
fn facet_cap_is_enforced() {
    init_logging();
    let (w, h) = (24usize, 24usize);
    let rgba = random_blocks_rgba(w, h, 3, &PALETTE6, 21);
    let Quantized {
        palette,
        mut color_indices,
        ..
    } = quantize(w, h, &rgba, 6);
    let mut scratch = FillScratch::new(w, h);
    let mut graph = build(&color_indices, &mut scratch);
    assert!(graph.live_count() > 5);

    let reducer = FacetReducer::new(
        ReduceOptions {
            min_facet_size: 1,
            max_facets: 5,
            order: RemovalOrder::LargeToSmall,
        },
        palette.distance_matrix(),
    );
    reducer
        .reduce(
            &mut graph,
            &mut color_indices,
            &mut scratch,
            &mut RunContext::default(),
        )
        .expect("reduced");
    assert!(graph.live_count() <= 5, "live={}", graph.live_count());
    assert!(graph.is_partition());
    assert_eq!(graph.total_pixel_count(), w * h);
}

#[test]
fn both_removal_orders_respect_threshold() {
    init_logging();
    let (w, h) = (32usize, 32usize);
    let rgba = random_blocks_rgba(w, h, 2, &PALETTE6, 4);
    for order in [RemovalOrder::LargeToSmall, RemovalOrder::SmallToLarge] {
        let Quantized {
            palette,
            mut color_indices,
            ..
        } = quantize(w, h, &rgba, 6);
        let mut scratch = FillScratch::new(w, h);
        let mut graph = build(&color_indices, &mut scratch);
        let reducer = FacetReducer::new(
            ReduceOptions {
                min_facet_size: 10,
                max_facets: 100_000,
                order,
            },
            palette.distance_matrix(),
        );
        reducer
            .reduce(
                &mut graph,
                &mut color_indices,
                &mut scratch,
                &mut RunContext::default(),
            )
            .expect("reduced");
        assert!(graph.is_partition(), "{order:?}");
        for id in graph.live_ids() {
            let count = graph.facet(id).map(|f| f.pixel_count).unwrap_or(0);
            assert!(
                count >= 10 || graph.neighbours(id).is_empty(),
                "{order:?}: facet {id} kept with {count} pixels"
            );
        }
    }
}
