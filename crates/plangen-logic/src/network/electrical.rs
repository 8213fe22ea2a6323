//! Electrical network: basement meter → riser → per-floor distribution
//! board → flat switchboards → room endpoints.

use crate::model::{Blueprint, Floor, Room, RoomType};

use super::plumbing::branch_y;
use super::{ElecNodeKind, ElectricalNetwork, FixtureCode, Level, NodeId, SegmentClass};

/// Riser position as a fraction of plate width.
pub const ELECTRICAL_RISER_FRACTION: f64 = 0.85;

/// Fixture fed by a room's endpoint.
pub fn fixture_for(room_type: RoomType) -> FixtureCode {
    match room_type {
        RoomType::Kitchen => FixtureCode::Power,
        RoomType::Bathroom => FixtureCode::Exhaust,
        _ => FixtureCode::Light,
    }
}

/// Where a flat's switchboard goes: its largest living room, else its first room.
fn switchboard_room<'a>(rooms: &[&'a Room]) -> Option<&'a Room> {
    rooms
        .iter()
        .copied()
        .filter(|r| r.room_type == RoomType::Living)
        .fold(None, |best: Option<&'a Room>, r| match best {
            Some(b) if b.area() >= r.area() => Some(b),
            _ => Some(r),
        })
        .or_else(|| rooms.first().copied())
}

fn add_endpoint(net: &mut ElectricalNetwork, floor: u32, room: &Room) -> NodeId {
    let (cx, cy) = room.centroid();
    let ep = net.add_node(
        format!("ep-f{floor}-{}", room.id),
        ElecNodeKind::Endpoint,
        Level::Floor(floor),
        cx,
        cy,
    );
    net.nodes[ep].room_id = Some(room.id.clone());
    net.nodes[ep].fixture = Some(fixture_for(room.room_type));
    ep
}

/// Build the electrical network of `blueprint`.
pub fn build_electrical(blueprint: &Blueprint) -> ElectricalNetwork {
    let mut net = ElectricalNetwork::new();
    let riser_x = blueprint.width * ELECTRICAL_RISER_FRACTION;

    let mut floors: Vec<&Floor> = blueprint.floors.iter().collect();
    floors.sort_by_key(|f| f.floor);

    let mut risers: Vec<NodeId> = Vec::with_capacity(floors.len());
    for floor in &floors {
        let f = floor.floor;
        let level = Level::Floor(f);
        let y = branch_y(floor, blueprint.depth);

        let joint = net.add_node(format!("riser-f{f}"), ElecNodeKind::Riser, level, riser_x, y);
        if let Some(&below) = risers.last() {
            net.connect(below, joint, SegmentClass::Riser);
        }
        risers.push(joint);

        let db = net.add_node(
            format!("db-f{f}"),
            ElecNodeKind::DistributionBoard,
            level,
            riser_x,
            y,
        );
        net.connect(joint, db, SegmentClass::Riser);

        for flat in &floor.flats {
            let rooms: Vec<&Room> = floor
                .flat_rooms(flat)
                .filter(|r| !r.room_type.is_circulation())
                .collect();
            let Some(host) = switchboard_room(&rooms) else {
                continue;
            };
            let sb = net.add_node(
                format!("sb-f{f}-{}", flat.flat_id),
                ElecNodeKind::Switchboard,
                level,
                host.x + host.width.min(4.0) / 4.0,
                host.y + host.height / 2.0,
            );
            net.connect(db, sb, SegmentClass::Branch);
            for room in rooms {
                let ep = add_endpoint(&mut net, f, room);
                net.connect(sb, ep, SegmentClass::Lateral);
            }
        }

        for room in &floor.rooms {
            if room.room_type.is_circulation() || floor.flat_of(&room.id).is_some() {
                continue;
            }
            let ep = add_endpoint(&mut net, f, room);
            net.connect(db, ep, SegmentClass::Lateral);
        }
    }

    if let Some(&ground) = risers.first() {
        let (x, y) = (net.nodes[ground].x, net.nodes[ground].y);
        let meter = net.add_node("meter", ElecNodeKind::Meter, Level::Basement, x, y);
        net.connect(meter, ground, SegmentClass::Main);
    }

    net
}
