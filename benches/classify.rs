use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use roomwarden::state::RoomStore;
use roomwarden::sync::Classifier;
use std::collections::{BTreeMap, BTreeSet};
use warden_proto::event::Membership;
use warden_proto::{Event, MemberId, RoomId, RoomMode, SyncBatch, SyncResponse};

fn seeded_store(room: &RoomId, members: usize) -> RoomStore {
    let store = RoomStore::new();
    store.seed(
        room,
        (0..members).map(|i| MemberId::new(format!("@user{i}:example.org"))),
        BTreeMap::from([(MemberId::new("@eve:example.org"), "spam".to_string())]),
        BTreeSet::from([RoomMode::BanlistSync, RoomMode::SelfModerator]),
        BTreeMap::new(),
    );
    store
}

fn classification_benchmark(c: &mut Criterion) {
    let room = RoomId::new("!bench:example.org");
    let store = seeded_store(&room, 10_000);
    let me = MemberId::new("@warden:example.org");
    let classifier = Classifier::new(&me, 0);

    let events = [
        Event::text(MemberId::new("@user1:example.org"), "!version", 1),
        Event::member(
            MemberId::new("@new:example.org"),
            &MemberId::new("@new:example.org"),
            Membership::Join,
            None,
            1,
        ),
        Event::member(
            MemberId::new("@mod:example.org"),
            &MemberId::new("@eve:example.org"),
            Membership::Leave,
            None,
            1,
        ),
        Event::member(
            MemberId::new("@mod:example.org"),
            &MemberId::new("@user7:example.org"),
            Membership::Ban,
            Some("flood"),
            1,
        ),
    ];

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("mixed_events", |b| {
        b.iter(|| {
            for event in &events {
                black_box(classifier.classify(&store, &room, black_box(event)));
            }
        })
    });
    group.finish();
}

fn sync_decode_benchmark(c: &mut Criterion) {
    let events: Vec<serde_json::Value> = (0..100)
        .map(|i| {
            serde_json::to_value(Event::text(
                MemberId::new(format!("@user{i}:example.org")),
                "hello there",
                i,
            ))
            .unwrap()
        })
        .collect();
    let raw = serde_json::json!({
        "next_batch": "s1",
        "rooms": { "join": { "!bench:example.org": { "timeline": { "events": events } } } }
    })
    .to_string();

    let mut group = c.benchmark_group("sync");
    group.throughput(Throughput::Bytes(raw.len() as u64));
    group.bench_function("decode_batch", |b| {
        b.iter(|| {
            let response: SyncResponse = serde_json::from_str(black_box(&raw)).unwrap();
            SyncBatch::from(response)
        })
    });
    group.finish();
}

criterion_group!(benches, classification_benchmark, sync_decode_benchmark);
criterion_main!(benches);
