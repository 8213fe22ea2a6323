//! Plumbing network: roof tank → riser → per-floor branch → wet rooms → drain.

use std::cmp::Ordering;

use crate::geometry::approx_eq;
use crate::model::{Blueprint, Floor, Room};

use super::{Level, NodeId, PipeNodeKind, PlumbingNetwork, SegmentClass};

/// Riser position as a fraction of plate width.
pub const PLUMBING_RISER_FRACTION: f64 = 0.15;

/// y of a floor's branch line: the corridor's centre line, or mid-depth.
pub fn branch_y(floor: &Floor, depth: f64) -> f64 {
    floor
        .corridor()
        .map(|c| c.y + c.height / 2.0)
        .unwrap_or(depth / 2.0)
}

fn wet_rooms(floor: &Floor) -> Vec<&Room> {
    let mut rooms: Vec<&Room> = floor.rooms.iter().filter(|r| r.room_type.is_wet()).collect();
    // tees sit under the centroid, so that is the order along the branch
    rooms.sort_by(|a, b| {
        a.centroid()
            .0
            .partial_cmp(&b.centroid().0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    rooms
}

/// Build the plumbing network of `blueprint`.
pub fn build_plumbing(blueprint: &Blueprint) -> PlumbingNetwork {
    let mut net = PlumbingNetwork::new();
    let riser_x = blueprint.width * PLUMBING_RISER_FRACTION;

    let mut floors: Vec<&Floor> = blueprint.floors.iter().collect();
    floors.sort_by_key(|f| f.floor);

    let mut risers: Vec<NodeId> = Vec::with_capacity(floors.len());
    for floor in &floors {
        let f = floor.floor;
        let y = branch_y(floor, blueprint.depth);
        let riser = net.add_node(
            format!("riser-f{f}"),
            PipeNodeKind::Riser,
            Level::Floor(f),
            riser_x,
            y,
        );
        if let Some(&below) = risers.last() {
            net.connect(below, riser, SegmentClass::Riser);
        }
        risers.push(riser);

        let rooms = wet_rooms(floor);
        if rooms.is_empty() {
            log::debug!("plumbing: floor {f} has no wet rooms, branch skipped");
            continue;
        }

        let left_most = rooms.iter().map(|r| r.x).fold(riser_x, f64::min);
        let right_most = rooms.iter().map(|r| r.x + r.width).fold(riser_x, f64::max);

        // Tees left of the riser chain outwards right-to-left, the rest left-to-right.
        let mut left_tail = riser;
        let mut right_tail = riser;
        let (left, right): (Vec<&Room>, Vec<&Room>) =
            rooms.iter().partition(|r| r.centroid().0 < riser_x);

        for room in right {
            right_tail = add_wet_room(&mut net, right_tail, room, f, y);
        }
        for room in left.into_iter().rev() {
            left_tail = add_wet_room(&mut net, left_tail, room, f, y);
        }

        if !approx_eq(right_most, riser_x) {
            let end = net.add_node(
                format!("branch-f{f}-east"),
                PipeNodeKind::Branch,
                Level::Floor(f),
                right_most,
                y,
            );
            net.connect(right_tail, end, SegmentClass::Branch);
        }
        if !approx_eq(left_most, riser_x) {
            let end = net.add_node(
                format!("branch-f{f}-west"),
                PipeNodeKind::Branch,
                Level::Floor(f),
                left_most,
                y,
            );
            net.connect(left_tail, end, SegmentClass::Branch);
        }
    }

    if let (Some(&bottom), Some(&top)) = (risers.first(), risers.last()) {
        let (top_x, top_y) = (net.nodes[top].x, net.nodes[top].y);
        let tank = net.add_node("tank", PipeNodeKind::Tank, Level::Roof, top_x, top_y);
        net.connect(tank, top, SegmentClass::Main);

        let (bx, by) = (net.nodes[bottom].x, net.nodes[bottom].y);
        let drain = net.add_node("drain", PipeNodeKind::Drain, Level::Basement, bx, by);
        net.connect(bottom, drain, SegmentClass::Main);
    }

    net
}

/// Add a tee on the branch line under `room` plus its endpoint; returns the tee.
fn add_wet_room(
    net: &mut PlumbingNetwork,
    prev: NodeId,
    room: &Room,
    floor: u32,
    y: f64,
) -> NodeId {
    let (cx, cy) = room.centroid();
    let level = Level::Floor(floor);
    let tee = net.add_node(format!("tee-f{floor}-{}", room.id), PipeNodeKind::Tee, level, cx, y);
    net.connect(prev, tee, SegmentClass::Branch);

    let endpoint = net.add_node(
        format!("ep-f{floor}-{}", room.id),
        PipeNodeKind::Endpoint,
        level,
        cx,
        cy,
    );
    net.nodes[endpoint].room_id = Some(room.id.clone());
    net.connect(tee, endpoint, SegmentClass::Lateral);
    tee
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProceduralLayout;
    use crate::geometry::Rect;
    use crate::model::{BuildingType, RoomType};

    fn blueprint(w: f64, d: f64, floors: u32, bt: BuildingType) -> Blueprint {
        Blueprint::new(w, d, bt, ProceduralLayout.floors(w, d, floors, bt))
    }

    #[test]
    fn test_house_plumbing_is_tree() {
        let bp = blueprint(40.0, 30.0, 1, BuildingType::House);
        let net = build_plumbing(&bp);
        assert!(net.is_tree());

        // kitchen + bathroom
        assert_eq!(net.nodes_of_kind(PipeNodeKind::Endpoint).count(), 2);
        assert_eq!(net.nodes_of_kind(PipeNodeKind::Tee).count(), 2);
        let tank = net.find("tank").unwrap();
        let drain = net.find("drain").unwrap();
        for ep in net.nodes_of_kind(PipeNodeKind::Endpoint) {
            assert_eq!(net.count_paths(ep, tank), 1);
            assert_eq!(net.count_paths(ep, drain), 1);
        }
    }

    #[test]
    fn test_branch_line_follows_corridor() {
        let bp = blueprint(40.0, 30.0, 1, BuildingType::House);
        let net = build_plumbing(&bp);
        let riser = &net.nodes[net.find("riser-f0").unwrap()];
        // corridor 13.2 + 3.6/2
        assert!((riser.y - 15.0).abs() < 1e-9);
        assert!((riser.x - 6.0).abs() < 1e-9);
        for tee in net.nodes_of_kind(PipeNodeKind::Tee) {
            assert!((net.nodes[tee].y - riser.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_riser_spans_every_floor() {
        let bp = blueprint(60.0, 40.0, 3, BuildingType::Apartment);
        let net = build_plumbing(&bp);
        assert!(net.is_tree());
        assert_eq!(net.segments_of_class(SegmentClass::Riser).count(), 2);
        assert_eq!(net.segments_of_class(SegmentClass::Main).count(), 2);
        // ground floor has no wet rooms; floors 1-2 have 4 each
        assert_eq!(net.nodes_of_kind(PipeNodeKind::Endpoint).count(), 8);
        assert!(net.find("tee-f0-f0-lobby").is_none());
    }

    #[test]
    fn test_branch_end_at_riser_is_omitted() {
        // riser at x = 6; a bathroom entirely east of it leaves no west end
        let mut bp = Blueprint::new(
            40.0,
            30.0,
            BuildingType::House,
            vec![Floor {
                floor: 0,
                label: "Ground Floor".into(),
                rooms: vec![Room::new(
                    "bath",
                    "Bath",
                    RoomType::Bathroom,
                    Rect::new(10.0, 0.0, 6.0, 8.0),
                )],
                flats: Vec::new(),
            }],
        );
        let net = build_plumbing(&bp);
        assert!(net.find("branch-f0-east").is_some());
        assert!(net.find("branch-f0-west").is_none());
        assert!(net.is_tree());

        bp.floors[0].rooms[0].x = 2.0;
        let net = build_plumbing(&bp);
        assert!(net.find("branch-f0-east").is_some());
        assert!(net.find("branch-f0-west").is_some());
        assert!(net.is_tree());
    }

    #[test]
    fn test_branch_chain_runs_outward() {
        // the wide kitchen starts left of the bathroom but its centre is east of it
        let bp = Blueprint::new(
            40.0,
            30.0,
            BuildingType::House,
            vec![Floor {
                floor: 0,
                label: "Ground Floor".into(),
                rooms: vec![
                    Room::new("kit", "Kitchen", RoomType::Kitchen, Rect::new(8.0, 0.0, 30.0, 12.0)),
                    Room::new("bath", "Bath", RoomType::Bathroom, Rect::new(10.0, 18.0, 4.0, 8.0)),
                ],
                flats: Vec::new(),
            }],
        );
        let net = build_plumbing(&bp);
        let riser = net.find("riser-f0").unwrap();
        let east = net.find("branch-f0-east").unwrap();
        let path = net.path(riser, east).unwrap();
        let xs: Vec<f64> = path.iter().map(|&n| net.nodes[n].x).collect();
        assert_eq!(xs.len(), 4);
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");
        assert_eq!(&xs[1..], &[12.0, 23.0, 38.0]);
    }

    #[test]
    fn test_removing_lateral_isolates_one_endpoint() {
        let bp = blueprint(60.0, 40.0, 3, BuildingType::Apartment);
        let net = build_plumbing(&bp);
        let tank = net.find("tank").unwrap();
        let endpoints: Vec<_> = net.nodes_of_kind(PipeNodeKind::Endpoint).collect();
        for lateral in net.segments_of_class(SegmentClass::Lateral) {
            let cut = net.without_segment(lateral);
            let reach = cut.reachable(tank);
            let lost = endpoints.iter().filter(|&&e| !reach[e]).count();
            assert_eq!(lost, 1);
        }
    }

    #[test]
    fn test_dry_floor_keeps_riser_joint() {
        let bp = blueprint(60.0, 40.0, 2, BuildingType::Commercial);
        let net = build_plumbing(&bp);
        assert!(net.find("riser-f0").is_some());
        assert!(net.find("riser-f1").is_some());
        assert!(net.is_tree());
    }
}
