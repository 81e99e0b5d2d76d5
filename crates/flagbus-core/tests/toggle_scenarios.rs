#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use flagbus_core::{
    EventBus, ScopeMode, SequentialIdGenerator, ToggleConfig, ToggleCoordinator, ToggleEvent,
    ToggleRegistry, Transport,
};
use proptest::prelude::*;
use serde_json::{Value, json};

type Event = ToggleEvent<Value>;

fn capture(coordinator: &ToggleCoordinator<Value>, name: &str) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    coordinator.register(name, move |event| l.borrow_mut().push(event.clone()));
    log
}

#[test]
fn modal_open_scenario() {
    let bus = EventBus::<Event>::new();
    let registry = ToggleRegistry::new();
    let coordinator = ToggleCoordinator::new(registry.clone(), bus);

    coordinator.add_item([("modalOpen", false)]);
    let log = capture(&coordinator, "modalOpen");

    coordinator.request_toggle("modalOpen", None);

    assert_eq!(*log.borrow(), vec![ToggleEvent::new(true, None)]);
    assert_eq!(registry.get_item("modalOpen"), Some(true));
}

#[test]
fn payload_on_unseen_name() {
    let bus = EventBus::<Event>::new();
    let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus);
    let log = capture(&coordinator, "x");

    coordinator.request_toggle("x", Some(json!({ "id": 5 })));

    assert_eq!(
        *log.borrow(),
        vec![ToggleEvent::new(true, Some(json!({ "id": 5 })))]
    );
}

#[test]
fn payload_is_not_persisted() {
    let bus = EventBus::<Event>::new();
    let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus);
    let log = capture(&coordinator, "x");

    coordinator.request_toggle("x", Some(json!("first")));
    coordinator.request_toggle("x", None);

    let log = log.borrow();
    assert_eq!(log[1], ToggleEvent::new(false, None));
}

#[test]
fn foreign_subscriber_sees_dispatch() {
    let bus = EventBus::<Event>::new();
    let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus.clone());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = bus.subscribe_fn(&coordinator.channel("drawer"), move |e: &Event| {
        s.borrow_mut().push(e.status);
    });

    coordinator.toggle("drawer");
    coordinator.toggle("drawer");
    coordinator.toggle("drawer");
    assert_eq!(*seen.borrow(), vec![true, false, true]);
}

#[test]
fn external_dispatch_sets_status_explicitly() {
    let bus = EventBus::<Event>::new();
    let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus.clone());
    coordinator.add_item([("panel", true)]);
    let log = capture(&coordinator, "panel");

    bus.dispatch(&coordinator.channel("panel"), &ToggleEvent::new(true, None));

    assert_eq!(coordinator.get_item("panel"), Some(true));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn per_instance_coordinators_are_isolated() {
    let bus = EventBus::<Event>::new();
    let a = ToggleCoordinator::new(ToggleRegistry::new(), bus.clone());
    let b = ToggleCoordinator::new(ToggleRegistry::new(), bus.clone());
    let b_log = capture(&b, "modal");

    a.toggle("modal");

    assert_eq!(a.get_item("modal"), Some(true));
    assert_eq!(b.get_item("modal"), None);
    assert!(b_log.borrow().is_empty());
    assert_ne!(a.channel("modal"), b.channel("modal"));
}

#[test]
fn name_qualified_coordinators_share_a_flag() {
    let bus = EventBus::<Event>::new();
    let config = ToggleConfig::name_qualified("dialogs");
    let a = ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config)
        .expect("valid config");
    let b = ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config)
        .expect("valid config");
    let b_log = capture(&b, "modal");

    a.toggle("modal");

    assert_eq!(a.get_item("modal"), Some(true));
    assert_eq!(b.get_item("modal"), Some(true));
    assert_eq!(*b_log.borrow(), vec![ToggleEvent::new(true, None)]);
    assert_eq!(a.channel("modal"), b.channel("modal"));
    assert_eq!(a.channel("modal").scope, "dialogs:modal");
}

#[test]
fn name_qualified_last_dispatch_wins() {
    let bus = EventBus::<Event>::new();
    let config = ToggleConfig::name_qualified("menus");
    let a = ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config)
        .expect("valid config");
    let b = ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config)
        .expect("valid config");

    a.set_status("menu", true, None);
    b.set_status("menu", false, None);

    assert_eq!(a.get_item("menu"), Some(false));
    assert_eq!(b.get_item("menu"), Some(false));
}

#[test]
fn shared_registry_between_coordinators() {
    let bus = EventBus::<Event>::new();
    let registry = ToggleRegistry::new();
    let a = ToggleCoordinator::new(registry.clone(), bus.clone());
    let b = ToggleCoordinator::new(registry.clone(), bus);

    a.toggle("flag");
    assert!(b.status("flag"), "registry is shared even though scopes differ");
}

#[test]
fn sequential_scope_is_deterministic_shape() {
    let bus = EventBus::<Event>::new();
    let scope = flagbus_core::EventScope::with_generator(&SequentialIdGenerator, 16);
    let c = ToggleCoordinator::from_parts(
        ToggleRegistry::new(),
        bus,
        scope.clone(),
        ScopeMode::PerInstance,
    );
    assert_eq!(c.scope(), &scope);
    assert_eq!(c.channel("x").scope, scope.scope_id());
}

#[test]
fn unsubscribe_then_dispatch_skips_callback() {
    let bus = EventBus::<Event>::new();
    let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus.clone());
    let channel = coordinator.channel("x");

    let hits = Rc::new(RefCell::new(0));
    let h = Rc::clone(&hits);
    let mut sub = bus.subscribe_fn(&channel, move |_: &Event| *h.borrow_mut() += 1);
    sub.unsubscribe();
    sub.unsubscribe();

    coordinator.toggle("x");
    assert_eq!(*hits.borrow(), 0);
}

proptest! {
    #[test]
    fn status_tracks_toggle_parity(n in 0usize..40, initial in any::<bool>()) {
        let bus = EventBus::<Event>::new();
        let coordinator = ToggleCoordinator::new(ToggleRegistry::new(), bus);
        coordinator.add_item([("p", initial)]);
        for _ in 0..n {
            coordinator.toggle("p");
        }
        prop_assert_eq!(coordinator.status("p"), initial ^ (n % 2 == 1));
    }
}
