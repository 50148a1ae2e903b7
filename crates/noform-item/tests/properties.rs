use noform_core::{Channel, EventOptions, Form, FormOptions, Status, Value};
use noform_item::{ChangeEvent, FormItem, ItemConfig, Node, normalize_change};
use proptest::prelude::*;
use serde_json::json;

fn any_channel() -> impl Strategy<Value = Channel> {
    prop_oneof![
        Just(Channel::Value),
        Just(Channel::Error),
        Just(Channel::Props),
        Just(Channel::Status),
    ]
}

fn payload_for(channel: Channel, seed: u8) -> Value {
    match channel {
        Channel::Value => json!(seed),
        Channel::Error => json!(format!("error {seed}")),
        Channel::Props => json!({"required": seed % 2 == 0, "full": seed % 3 == 0}),
        Channel::Status => match seed % 4 {
            0 => Status::Edit.to_value(),
            1 => Status::Preview.to_value(),
            2 => Status::Disabled.to_value(),
            _ => Status::Hidden.to_value(),
        },
    }
}

/// A write the watched item must not react to: silent on its own name, or
/// non-silent on another field's name.
#[derive(Debug, Clone)]
struct Unrelated {
    channel: Channel,
    own_name: bool,
    seed: u8,
}

fn unrelated() -> impl Strategy<Value = Unrelated> {
    (any_channel(), any::<bool>(), any::<u8>()).prop_map(|(channel, own_name, seed)| Unrelated {
        channel,
        own_name,
        seed,
    })
}

proptest! {
    #[test]
    fn unrelated_writes_leave_output_untouched(
        writes in prop::collection::vec(unrelated(), 1..24),
        listen_error in any::<bool>(),
        listen_props in any::<bool>(),
    ) {
        let form = Form::new(FormOptions::default());
        let item = FormItem::new(
            Some(&form),
            ItemConfig::new("age")
                .label("Age")
                .listen_error(listen_error)
                .listen_props(listen_props)
                .listen_keys(["age"])
                .render(|values| Node::text(values.to_string())),
        )
        .unwrap();
        let _other = FormItem::new(Some(&form), ItemConfig::new("other")).unwrap();
        item.mount();

        let before = item.output();
        let renders = item.render_count();

        for write in &writes {
            let value = payload_for(write.channel, write.seed);
            if write.own_name {
                form.set_silent(write.channel, "age", value);
            } else {
                form.set(write.channel, "other", value);
            }
        }

        prop_assert_eq!(item.render_count(), renders);
        prop_assert_eq!(item.output(), before);
    }

    #[test]
    fn text_input_commits_the_typed_string(text in ".{0,32}") {
        let form = Form::new(FormOptions::default());
        let item = FormItem::new(Some(&form), ItemConfig::new("name")).unwrap();
        item.mount();

        item.on_change(ChangeEvent::input(text.clone()), EventOptions::default()).unwrap();
        prop_assert_eq!(form.get_item_value("name"), Some(Value::String(text)));
    }

    #[test]
    fn checkbox_commits_checked(checked in any::<bool>()) {
        let committed = normalize_change(&ChangeEvent::checked(checked), false).unwrap();
        prop_assert_eq!(committed, Value::Bool(checked));
    }

    #[test]
    fn structured_values_round_trip(
        entries in prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..8),
    ) {
        let value = serde_json::to_value(&entries).unwrap();
        let committed = normalize_change(&ChangeEvent::Value(value.clone()), false).unwrap();
        prop_assert_eq!(&committed, &value);

        let escaped = normalize_change(&ChangeEvent::Value(value.clone()), true).unwrap();
        prop_assert_eq!(escaped, value);
    }
}
