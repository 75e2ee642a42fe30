use demux::graph::{Aggregate, DegreeSequence, Edge, NodeId, Observations};
use demux::io::{parse_aggregate, parse_observations, write_multiplex};
use demux::reconstruct::{reconstruct, ReconstructionConfig, SideInformation};
use demux::Error;

fn e(a: NodeId, b: NodeId) -> Edge {
    Edge::new(a, b).unwrap()
}

fn square() -> (Aggregate, Observations) {
    let agg = parse_aggregate("1 2\n2 3\n3 4\n1 4\n").unwrap();
    let obs = parse_observations("0 1 2\n1 3 4\n").unwrap();
    (agg, obs)
}

#[test]
fn square_with_two_observed_edges() {
    let (agg, obs) = square();
    let side = SideInformation::Observations(obs);

    let mut seen = [[0usize; 2]; 2];
    for seed in 0..200 {
        let config = ReconstructionConfig::new().with_seed(seed);
        let r = reconstruct(&agg, &side, &config).unwrap();

        assert_eq!(r.multiplex.edge_layers(&e(1, 2)), vec![0]);
        assert_eq!(r.multiplex.edge_layers(&e(3, 4)), vec![1]);
        assert_eq!(r.mu, 1.0);

        for (slot, edge) in [e(2, 3), e(1, 4)].iter().enumerate() {
            let layers = r.multiplex.edge_layers(edge);
            assert_eq!(layers.len(), 1);
            seen[slot][layers[0]] += 1;
        }
    }
    // Both unknown edges are exact ties; each layer should win sometimes.
    for counts in seen {
        assert!(counts[0] > 60 && counts[1] > 60, "{counts:?}");
    }
}

#[test]
fn reversed_edge_input_gives_identical_result() {
    let (agg, obs) = square();
    let reversed = parse_aggregate("2 1\n3 2\n4 3\n4 1\n").unwrap();
    assert_eq!(agg, reversed);

    let config = ReconstructionConfig::new().with_seed(3).with_soft_output(true);
    let a = reconstruct(&agg, &SideInformation::Observations(obs.clone()), &config).unwrap();
    let b = reconstruct(&reversed, &SideInformation::Observations(obs), &config).unwrap();
    assert_eq!(a.mapping, b.mapping);
    assert_eq!(a.likelihoods, b.likelihoods);
}

#[test]
fn soft_output_vectors_are_normalized() {
    let agg = Aggregate::from_pairs([(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3)])
        .unwrap();
    let mut obs = Observations::new();
    obs.entry(0).or_default().insert(e(0, 1));
    obs.entry(1).or_default().insert(e(4, 5));

    let config = ReconstructionConfig::new()
        .with_seed(17)
        .with_community_detection(true)
        .with_soft_output(true);
    let r = reconstruct(&agg, &SideInformation::Observations(obs), &config).unwrap();

    let likelihoods = r.likelihoods.unwrap();
    assert_eq!(likelihoods.len(), 5);
    for (edge, vector) in &likelihoods {
        let sum: f64 = vector.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "{edge}: {vector:?}");
        let best = vector.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(vector[r.mapping[edge]], best);
    }
}

#[test]
fn degree_sequence_mode_isolated_edge_is_tie_broken() {
    // Node 7 and 8 have degree 0 everywhere: degenerate, but not an error.
    let agg = Aggregate::from_pairs([(0, 1), (7, 8)]).unwrap();
    let mut a = DegreeSequence::from_dense(&[1, 1]);
    a.insert(7, 0);
    a.insert(8, 0);
    let side = SideInformation::DegreeSequences(vec![a.clone(), a]);

    let mut wins = [0usize; 2];
    for seed in 0..200 {
        let r = reconstruct(&agg, &side, &ReconstructionConfig::new().with_seed(seed)).unwrap();
        wins[r.mapping[&e(7, 8)]] += 1;
        assert_eq!(r.multiplex.total_edges(), 2);
    }
    assert!(wins[0] > 60 && wins[1] > 60, "{wins:?}");
}

#[test]
fn output_round_trips_through_edgelist() {
    let (agg, obs) = square();
    let r = reconstruct(
        &agg,
        &SideInformation::Observations(obs),
        &ReconstructionConfig::new().with_seed(0),
    )
    .unwrap();

    let mut buf = Vec::new();
    write_multiplex(&r.multiplex, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let back = parse_observations(&text).unwrap();

    let edges: usize = back.values().map(|s| s.len()).sum();
    assert_eq!(edges, 4);
    assert!(back[&0].contains(&e(1, 2)));
    assert!(back[&1].contains(&e(3, 4)));
}

#[test]
fn missing_mode_is_rejected_before_work() {
    assert!(matches!(
        SideInformation::from_parts(None, None),
        Err(Error::UnsupportedMode(_))
    ));
}
