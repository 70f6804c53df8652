use rust_csma::fixtures::{two_node_config, two_node_timelines};
use rust_csma::scheduler::timelines_from;
use rust_csma::{ConstantSource, Efficiency, Event, EventType, Scheduler, SensingMode};

fn replay(sensing: SensingMode) -> (Scheduler, rust_csma::SimResult) {
    let config = two_node_config().with_sensing(sensing);
    let timelines = timelines_from(two_node_timelines()).unwrap();
    let mut scheduler = Scheduler::new(&config, timelines).unwrap().with_trace();
    let result = scheduler.run(&mut ConstantSource(0.0));
    (scheduler, result)
}

fn successes(events: &mut Vec<Event>, sends: &[(usize, f64)]) {
    events.extend(sends.iter().map(|&(node, time)| Event::success(node, time)));
}

fn collisions(events: &mut Vec<Event>, time: f64, times: usize) {
    events.extend((0..times).map(|_| Event::collision(0, time, vec![1])));
}

#[test]
fn persistent_fixture_trace() {
    let (scheduler, result) = replay(SensingMode::Persistent);

    let mut expected = Vec::new();
    successes(&mut expected, &[(0, 5.0)]);
    collisions(&mut expected, 12.0, 10);
    successes(&mut expected, &[(0, 12.0)]);
    collisions(&mut expected, 19.0, 10);
    successes(
        &mut expected,
        &[
            (1, 19.0),
            (1, 26.0),
            (1, 33.0),
            (1, 40.0),
            (0, 60.0),
            (1, 67.0),
            (1, 74.0),
            (0, 81.0),
            (0, 88.0),
            (0, 95.0),
            (0, 102.0),
            (0, 109.0),
        ],
    );

    assert_eq!(scheduler.trace(), expected.as_slice());
    let collided: Vec<&Event> = scheduler
        .trace()
        .iter()
        .filter(|e| e.event_type() == EventType::Collision)
        .collect();
    assert_eq!(collided.len(), 20);
    assert!(collided
        .iter()
        .all(|e| e.get_sender() == 0 && e.conflicts() == [1]));
    assert_eq!(result.attempted, 54);
    assert_eq!(result.successful, 14);
    assert_eq!(result.dropped, 4);
    assert_eq!(result.throughput(), 52.5);
    assert!(scheduler.nodes().iter().all(|n| n.head().is_none()));
}

#[test]
fn non_persistent_fixture_trace() {
    let (scheduler, result) = replay(SensingMode::NonPersistent);

    let mut expected = Vec::new();
    successes(
        &mut expected,
        &[
            (0, 5.0),
            (0, 12.0),
            (0, 19.0),
            (0, 26.0),
            (0, 60.0),
            (1, 68.0),
            (0, 80.0),
            (0, 88.0),
            (0, 95.0),
            (0, 102.0),
            (0, 109.0),
        ],
    );

    assert_eq!(scheduler.trace(), expected.as_slice());
    assert!(scheduler
        .trace()
        .iter()
        .all(|e| e.event_type() == EventType::Success && e.conflicts().is_empty()));
    assert_eq!(result.attempted, 11);
    assert_eq!(result.successful, 11);
    assert_eq!(result.dropped, 7);
    assert_eq!(result.efficiency(), Efficiency::Ratio(1.0));
    assert_eq!(result.throughput(), 41.25);
}

#[test]
fn fixture_replays_identically() {
    for sensing in [SensingMode::Persistent, SensingMode::NonPersistent] {
        let (first, a) = replay(sensing);
        let (second, b) = replay(sensing);
        assert_eq!(a, b);
        assert_eq!(first.trace(), second.trace());
    }
}
