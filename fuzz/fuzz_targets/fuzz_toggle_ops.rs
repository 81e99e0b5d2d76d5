#![no_main]

//! Drives random operation sequences through two coordinators sharing a
//! bus and checks them against a plain map model.

use std::collections::HashMap;

use arbitrary::Arbitrary;
use flagbus_core::{EventBus, ToggleConfig, ToggleCoordinator, ToggleEvent, ToggleRegistry};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Toggle { who: bool, name: u8 },
    Set { who: bool, name: u8, status: bool },
    Add { who: bool, name: u8, status: bool },
    Unsubscribe { who: bool, name: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    name_qualified: bool,
    ops: Vec<Op>,
}

fn name(n: u8) -> String {
    format!("t{}", n % 4)
}

fuzz_target!(|input: Input| {
    let bus = EventBus::<ToggleEvent<u8>>::new();
    let config = if input.name_qualified {
        ToggleConfig::name_qualified("fuzz")
    } else {
        ToggleConfig::per_instance()
    };
    let coordinators = [
        ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config).unwrap(),
        ToggleCoordinator::with_config(ToggleRegistry::new(), bus.clone(), &config).unwrap(),
    ];

    for op in input.ops.iter().take(256) {
        match op {
            Op::Toggle { who, name: n } => {
                let c = &coordinators[usize::from(*who)];
                let before = c.status(&name(*n));
                c.toggle(&name(*n));
                assert_eq!(c.status(&name(*n)), !before);
            }
            Op::Set { who, name: n, status } => {
                let c = &coordinators[usize::from(*who)];
                c.set_status(&name(*n), *status, Some(*n));
                assert_eq!(c.get_item(&name(*n)), Some(*status));
            }
            Op::Add { who, name: n, status } => {
                let c = &coordinators[usize::from(*who)];
                c.add_item([(name(*n), *status)]);
                assert_eq!(c.get_item(&name(*n)), Some(*status));
            }
            Op::Unsubscribe { who, name: n } => {
                let c = &coordinators[usize::from(*who)];
                c.unsubscribe(&name(*n));
                assert!(!c.is_subscribed(&name(*n)));
            }
        }
    }

    let mut live: HashMap<String, usize> = HashMap::new();
    for c in &coordinators {
        for n in 0..4u8 {
            if c.is_subscribed(&name(n)) {
                *live.entry(name(n)).or_default() += 1;
            }
        }
    }
    if !input.name_qualified {
        let total: usize = live.values().sum();
        assert_eq!(bus.channel_count(), total);
    }
});
