use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use noform_core::{Broadcast, Channel, Form, FormOptions, Subscription, Value};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct Write {
    channel: Channel,
    name: &'static str,
    value: u8,
    silent: bool,
}

fn any_write() -> impl Strategy<Value = Write> {
    (
        prop_oneof![
            Just(Channel::Value),
            Just(Channel::Error),
            Just(Channel::Props),
            Just(Channel::Status),
        ],
        prop_oneof![Just("age"), Just("name"), Just("")],
        0u8..3,
        any::<bool>(),
    )
        .prop_map(|(channel, name, value, silent)| Write {
            channel,
            name,
            value,
            silent,
        })
}

proptest! {
    #[test]
    fn every_write_broadcasts_and_reports_change(
        writes in prop::collection::vec(any_write(), 1..40),
    ) {
        let form = Form::new(FormOptions::default());
        let seen: Rc<RefCell<Vec<Broadcast>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let _sub = form.on_change(move |b| sink.borrow_mut().push(b.clone()));

        let mut model: HashMap<(Channel, &str), Value> = HashMap::new();
        for (i, write) in writes.iter().enumerate() {
            let value = json!(write.value);
            let previous = model.insert((write.channel, write.name), value.clone());
            let commit = if write.silent {
                form.set_silent(write.channel, write.name, value.clone())
            } else {
                form.set(write.channel, write.name, value.clone())
            };

            prop_assert_eq!(commit.changed, previous.as_ref() != Some(&value));
            prop_assert_eq!(form.get_item(write.channel, write.name), Some(value.clone()));

            let seen = seen.borrow();
            prop_assert_eq!(seen.len(), i + 1);
            let last = &seen[i];
            prop_assert_eq!(last.channel, write.channel);
            prop_assert_eq!(last.name.as_str(), write.name);
            prop_assert_eq!(last.silent, write.silent);
            prop_assert_eq!(&last.value, &value);
        }
    }

    #[test]
    fn live_listeners_hear_in_registration_order(
        keep in prop::collection::vec(any::<bool>(), 1..12),
    ) {
        let form = Form::new(FormOptions::default());
        let log: Rc<RefCell<Vec<usize>>> = Rc::default();
        let mut subs: Vec<Option<Subscription>> = keep
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let sink = Rc::clone(&log);
                Some(form.on_change(move |_| sink.borrow_mut().push(i)))
            })
            .collect();
        for (slot, kept) in subs.iter_mut().zip(&keep) {
            if !kept {
                slot.take();
            }
        }

        form.set_value("age", json!(1));

        let expected: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, kept)| kept.then_some(i))
            .collect();
        prop_assert_eq!(form.listener_count(), expected.len());
        prop_assert_eq!(&*log.borrow(), &expected);
    }
}
