//! Registry integration tests.
//!
//! Member selection, metadata summaries, custom type registration rules and
//! `$type` naming strategies as seen through the [`Json`] facade.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use jsonmap::{
    reflect_object, reflect_opaque, ContractTypeNames, CustomType, Json, JsonError, Member,
    MemberSelection, ObjectShape, SerializationInfo, Settings, Shape, TypeHandle,
    TypeNameStrategy, Typed,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq)]
struct Account {
    id: i64,
    owner: String,
    balance: f64,
    notes: String,
}

reflect_object!(Account);

impl Typed for Account {
    fn shape() -> Shape {
        ObjectShape::new::<Self>()
            .contract(Some("bank"), "Account")
            .member(Member::field("Id", |a: &Self| &a.id, |a: &mut Self, v| a.id = v).include())
            .member(Member::field("Owner", |a: &Self| &a.owner, |a: &mut Self, v| a.owner = v).rename("owner"))
            .member(Member::field("Balance", |a: &Self| &a.balance, |a: &mut Self, v| a.balance = v))
            .member(Member::field("Notes", |a: &Self| &a.notes, |a: &mut Self, v| a.notes = v).ignore())
            .into()
    }
}

fn account() -> Account {
    Account {
        id: 9,
        owner: "ann".into(),
        balance: 10.5,
        notes: "private".into(),
    }
}

#[derive(Debug, Default)]
struct Clash {
    first: i32,
    second: i32,
}

reflect_object!(Clash);

impl Typed for Clash {
    fn shape() -> Shape {
        ObjectShape::new::<Self>()
            .member(Member::field("First", |c: &Self| &c.first, |c: &mut Self, v| c.first = v).rename("X"))
            .member(Member::field("Second", |c: &Self| &c.second, |c: &mut Self, v| c.second = v).rename("X"))
            .into()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Summary {
    total: i32,
}

reflect_object!(Summary);

impl Typed for Summary {
    fn shape() -> Shape {
        ObjectShape::new::<Self>()
            .member(Member::field("Total", |s: &Self| &s.total, |s: &mut Self, v| s.total = v))
            .member(Member::computed("Double", |s: &Self| s.total * 2))
            .member(Member::read_only("Same", |s: &Self| &s.total))
            .into()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token(String);

reflect_opaque!(Token);

// ============================================================================
// Member Selection
// ============================================================================

#[test]
fn opt_out_writes_unmarked_members() {
    let json = Json::new();
    assert_eq!(
        json.to_json(&account()).unwrap(),
        r#"{"Id":9,"owner":"ann","Balance":10.5}"#
    );
}

#[test]
fn opt_in_writes_marked_members_only() {
    let settings = Settings {
        member_selection: MemberSelection::OptIn,
        ..Settings::standard()
    };
    let json = Json::with_settings(settings);
    assert_eq!(json.to_json(&account()).unwrap(), r#"{"Id":9,"owner":"ann"}"#);

    // Unselected members are ignored on read as well.
    let read = json
        .read_object::<Account>(r#"{"Id":1,"owner":"bo","Balance":3,"Notes":"n"}"#)
        .unwrap();
    assert_eq!(
        read,
        Account {
            id: 1,
            owner: "bo".into(),
            ..Account::default()
        }
    );
}

#[test]
fn read_only_members_follow_setting() {
    let json = Json::new();
    assert_eq!(
        json.to_json(&Summary { total: 4 }).unwrap(),
        r#"{"Total":4,"Double":8,"Same":4}"#
    );

    let settings = Settings {
        include_read_only: false,
        ..Settings::standard()
    };
    let json = Json::with_settings(settings);
    assert_eq!(json.to_json(&Summary { total: 4 }).unwrap(), r#"{"Total":4}"#);
    // Excluded members are no longer rejected when present on read.
    let read = json
        .read_object::<Summary>(r#"{"Total":2,"Double":99}"#)
        .unwrap();
    assert_eq!(read, Summary { total: 2 });
}

#[test]
fn read_only_member_in_input_is_rejected() {
    let err = Json::new()
        .read_object::<Summary>(r#"{"Total":2,"Double":4}"#)
        .unwrap_err();
    assert!(matches!(err, JsonError::NotWritable { ref member, .. } if member == "Double"));
    assert_eq!(err.code(), 403);
}

#[test]
fn duplicate_wire_name_is_reported() {
    let json = Json::new();
    let err = json.to_json(&Clash::default()).unwrap_err();
    assert_eq!(
        err,
        JsonError::DuplicateWireName {
            name: "X".into(),
            type_name: std::any::type_name::<Clash>(),
        }
    );
    assert_eq!(err.code(), 300);
    assert_eq!(json.read_object::<Clash>("{}").unwrap_err().code(), 300);
}

// ============================================================================
// Serialization Members
// ============================================================================

#[test]
fn serialization_members_describe_getters() {
    let json = Json::new();
    let members = json.serialization_members::<Account>().unwrap();
    let declaring = std::any::type_name::<Account>();
    assert_eq!(
        members,
        vec![
            SerializationInfo {
                member_name: "Id",
                wire_name: "Id",
                member_type: "i64",
                declaring_type: declaring,
            },
            SerializationInfo {
                member_name: "Owner",
                wire_name: "owner",
                member_type: std::any::type_name::<String>(),
                declaring_type: declaring,
            },
            SerializationInfo {
                member_name: "Balance",
                wire_name: "Balance",
                member_type: "f64",
                declaring_type: declaring,
            },
        ]
    );
}

#[test]
fn serialization_members_of_scalars_are_empty() {
    let json = Json::new();
    assert!(json.serialization_members::<i32>().unwrap().is_empty());
    assert!(json.serialization_members::<Vec<Account>>().unwrap().is_empty());
}

// ============================================================================
// Custom Type Rules
// ============================================================================

#[test]
fn builtin_types_cannot_be_overridden() {
    let json = Json::new();
    let err = json
        .register_custom_type(CustomType::<i32>::new().serialize(|v| v.to_string()))
        .unwrap_err();
    assert_eq!(err.code(), 301);

    let err = json
        .register_custom_type(CustomType::<HashMap<String, i32>>::new().serialize(|_| String::new()))
        .unwrap_err();
    assert_eq!(err.code(), 301);
}

#[test]
fn custom_type_needs_a_handler() {
    let err = Json::new()
        .register_custom_type(CustomType::<Token>::new())
        .unwrap_err();
    assert_eq!(err, JsonError::InvalidCustomType {
        type_name: std::any::type_name::<Token>(),
    });
    assert_eq!(err.code(), 302);
}

#[test]
fn custom_object_type_replaces_members() {
    let json = Json::new();
    assert_eq!(json.to_json(&Summary { total: 1 }).unwrap(), r#"{"Total":1,"Double":2,"Same":1}"#);

    json.register_custom_type(
        CustomType::<Summary>::new().serialize(|s| format!("total={}", s.total)),
    )
    .unwrap();
    assert_eq!(json.to_json(&Summary { total: 1 }).unwrap(), r#""total=1""#);
    assert!(json.registry().is_custom_type(TypeHandle::of::<Summary>()));
}

#[test]
fn registrations_are_per_context() {
    let custom = Json::new();
    custom
        .register_custom_type(CustomType::<Token>::new().serialize(|t| t.0.clone()))
        .unwrap();
    assert_eq!(custom.to_json(&Token("abc".into())).unwrap(), r#""abc""#);
    assert_eq!(Json::new().to_json(&Token("abc".into())).unwrap_err().code(), 203);
}

// ============================================================================
// Type Names
// ============================================================================

#[test]
fn contract_names_tag_and_resolve() {
    let json = Json::with_settings(Settings::polymorphic());
    json.register_type_name_strategy(ContractTypeNames::new().with::<Account>());

    let text = json.to_json(&account()).unwrap();
    assert_eq!(text, r#"{"$type":"bank/Account","Id":9,"owner":"ann","Balance":10.5}"#);

    let built = json.read_object_dyn(&text, None).unwrap();
    let read = built.as_any().downcast_ref::<Account>().unwrap();
    assert_eq!(read.owner, "ann");
}

#[test]
fn contract_names_fall_back_to_type_path() {
    let strategy = ContractTypeNames::new().with::<Summary>();
    let handle = TypeHandle::of::<Summary>();
    assert_eq!(strategy.name_for(&handle), std::any::type_name::<Summary>());
    assert_eq!(strategy.resolve(std::any::type_name::<Summary>()), Some(handle));
    assert_eq!(strategy.resolve("bank/Account"), None);
}

#[test]
fn type_name_conflicts() {
    let json = Json::new();
    json.register_type_as::<Account>("acct").unwrap();
    // Registering the same pair again is harmless.
    json.register_type_as::<Account>("acct").unwrap();

    assert_eq!(json.register_type_as::<Summary>("acct").unwrap_err().code(), 303);
    assert_eq!(json.register_type_as::<Account>("other").unwrap_err().code(), 303);
    assert_eq!(json.register_type_as::<Summary>("").unwrap_err().code(), 201);
}

#[test]
fn register_type_uses_strategy_name() {
    let json = Json::new();
    let name = json.register_type::<Summary>().unwrap();
    assert_eq!(name, std::any::type_name::<Summary>());
    assert_eq!(
        json.registry().type_names().try_resolve(&name),
        Some(TypeHandle::of::<Summary>())
    );
}

struct ShortNames;

impl TypeNameStrategy for ShortNames {
    fn name_for(&self, handle: &TypeHandle) -> String {
        handle.name().rsplit("::").next().unwrap_or_default().to_lowercase()
    }

    fn resolve(&self, name: &str) -> Option<TypeHandle> {
        (name == "summary").then(TypeHandle::of::<Summary>)
    }
}

#[test]
fn replacing_strategy_forgets_names() {
    let json = Json::with_settings(Settings::polymorphic());
    json.register_type_as::<Summary>("sum").unwrap();
    json.register_type_name_strategy(ShortNames);

    assert!(json.registry().type_names().try_resolve("sum").is_none());
    let text = json.to_json(&Summary { total: 3 }).unwrap();
    assert!(text.starts_with(r#"{"$type":"summary","#), "{}", text);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn registry_shared_between_threads() {
    let json = Arc::new(Json::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let json = Arc::clone(&json);
            thread::spawn(move || {
                let account = Account {
                    id: i,
                    ..account()
                };
                let text = json.to_json(&account).unwrap();
                json.read_object::<Account>(&text).unwrap().id
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());
}
