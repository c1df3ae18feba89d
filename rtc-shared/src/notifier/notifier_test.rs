use super::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum TestEvent {
    Started,
    Data(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TestEventKind {
    Started,
    Data,
}

impl Event for TestEvent {
    type Kind = TestEventKind;

    fn kind(&self) -> TestEventKind {
        match self {
            TestEvent::Started => TestEventKind::Started,
            TestEvent::Data(_) => TestEventKind::Data,
        }
    }
}

#[test]
fn test_notifier_on_runs_every_emit() {
    let seen = Arc::new(Mutex::new(vec![]));
    let mut notifier = Notifier::new();

    let s = Arc::clone(&seen);
    notifier.on(TestEventKind::Data, move |event: &TestEvent| {
        if let TestEvent::Data(v) = event {
            s.lock().unwrap().push(*v);
        }
    });

    assert_eq!(notifier.emit(&TestEvent::Data(1)), 1);
    assert_eq!(notifier.emit(&TestEvent::Data(2)), 1);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert_eq!(notifier.listener_count(TestEventKind::Data), 1);
}

#[test]
fn test_notifier_once_runs_a_single_time() {
    let count = Arc::new(Mutex::new(0));
    let mut notifier = Notifier::new();

    let c = Arc::clone(&count);
    notifier.once(TestEventKind::Started, move |_| {
        *c.lock().unwrap() += 1;
    });
    assert_eq!(notifier.listener_count(TestEventKind::Started), 1);

    assert_eq!(notifier.emit(&TestEvent::Started), 1);
    assert_eq!(notifier.emit(&TestEvent::Started), 0);
    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(notifier.listener_count(TestEventKind::Started), 0);
}

#[test]
fn test_notifier_keeps_registration_order() {
    let order = Arc::new(Mutex::new(vec![]));
    let mut notifier = Notifier::new();

    for i in 0..3 {
        let o = Arc::clone(&order);
        if i == 1 {
            notifier.once(TestEventKind::Started, move |_| o.lock().unwrap().push(i));
        } else {
            notifier.on(TestEventKind::Started, move |_| o.lock().unwrap().push(i));
        }
    }

    notifier.emit(&TestEvent::Started);
    notifier.emit(&TestEvent::Started);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 0, 2]);
}

#[test]
fn test_notifier_kinds_are_independent() {
    let count = Arc::new(Mutex::new(0));
    let mut notifier = Notifier::new();

    let c = Arc::clone(&count);
    notifier.on(TestEventKind::Started, move |_| *c.lock().unwrap() += 1);

    assert_eq!(notifier.emit(&TestEvent::Data(7)), 0);
    assert_eq!(*count.lock().unwrap(), 0);

    notifier.remove_all_listeners(TestEventKind::Started);
    assert_eq!(notifier.emit(&TestEvent::Started), 0);
    assert_eq!(*count.lock().unwrap(), 0);
}
