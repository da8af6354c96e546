//! Air cluster detection against hand-drawn grids.

use sandart::{find_clusters, CellKind, Grid};

#[test]
fn clusters_are_four_connected() {
    let grid = Grid::from_rows(&[
        "o~o", //
        "~o~",
        "o~o",
    ]);
    // Diagonal neighbors do not join.
    assert_eq!(find_clusters(&grid).len(), 5);

    let grid = Grid::from_rows(&[
        "ooo", //
        "~o~",
        "~o~",
    ]);
    let map = find_clusters(&grid);
    assert_eq!(map.len(), 1);
    assert_eq!(map.clusters()[0].len(), 5);
}

#[test]
fn shape_metrics_follow_bounding_box() {
    let grid = Grid::from_rows(&[
        "~~~~~", //
        "~oo~~",
        "~o~~~",
        "~o~~~",
        "~o~~~",
    ]);
    let map = find_clusters(&grid);
    let cluster = &map.clusters()[0];

    assert_eq!((cluster.min_x, cluster.max_x), (1, 2));
    assert_eq!((cluster.min_y, cluster.max_y), (1, 4));
    assert_eq!(cluster.width(), 2);
    assert_eq!(cluster.height(), 4);
    assert!((cluster.ratio() - 2.0).abs() < 1e-6);
    assert!((cluster.center().x - 1.5).abs() < 1e-6);
    assert!((cluster.center().y - 2.5).abs() < 1e-6);

    assert!(cluster.should_split(1.8));
    assert!(!cluster.should_split(2.0));
}

#[test]
fn labels_point_back_at_owning_cluster() {
    let grid = Grid::from_rows(&[
        "oo~~", //
        "~~~o",
        "~~~o",
    ]);
    let map = find_clusters(&grid);
    assert_eq!(map.len(), 2);

    let first = map.cluster_at(1, 0).unwrap();
    assert!(first.cells.contains(&(0, 0)));
    let second = map.cluster_at(3, 2).unwrap();
    assert_eq!(second.cells, vec![(3, 1), (3, 2)]);

    assert!(map.cluster_at(2, 0).is_none());
    assert!(map.cluster_at(9, 9).is_none());
}

#[test]
fn flood_fill_is_deterministic() {
    let rows = [
        "o~oo~o~", //
        "oo~o~oo",
        "~~~o~~~",
        "o~ooo~o",
    ];
    let grid = Grid::from_rows(&rows);
    let a = find_clusters(&grid);
    let b = find_clusters(&grid);
    assert_eq!(a.clusters(), b.clusters());

    // Numbered by first cell in row-major order
    let firsts: Vec<_> = a.clusters().iter().map(|c| c.cells[0]).collect();
    let mut sorted = firsts.clone();
    sorted.sort_by_key(|&(x, y)| (y, x));
    assert_eq!(firsts, sorted);
}

#[test]
fn no_air_means_no_clusters() {
    let grid = Grid::filled(6, 4, CellKind::Water);
    assert!(find_clusters(&grid).is_empty());
}
