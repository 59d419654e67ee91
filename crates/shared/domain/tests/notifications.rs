use flock_domain::notifications::{TargetType, Verb, VerbSet};

#[test]
fn verbs_round_trip_through_strings() {
    for verb in Verb::ALL {
        assert_eq!(verb.as_str().parse::<Verb>().unwrap(), verb);
    }
    assert!("poke".parse::<Verb>().is_err());
    assert_eq!("comment".parse::<TargetType>().unwrap(), TargetType::Comment);
}

#[test]
fn messages_name_the_actor() {
    assert_eq!(Verb::Follow.message("ann"), "ann started following you");
    assert_eq!(Verb::Like.message("ann"), "ann liked your post");
    assert_eq!(Verb::Comment.message("ann"), "ann commented on your post");
    assert_eq!(Verb::Mention.message("ann"), "ann mentioned you");
    assert_eq!(Verb::Reply.message("ann"), "ann replied to your comment");
}

#[test]
fn verb_set_gates_verbs() {
    let prefs = VerbSet::ALL - VerbSet::COMMENT;
    assert!(prefs.allows(Verb::Reply));
    assert!(prefs.allows(Verb::Follow));
    assert!(!prefs.allows(Verb::Comment));

    assert_eq!(VerbSet::from("like"), VerbSet::LIKE);
    assert_eq!(VerbSet::from("*"), VerbSet::ALL);
    assert!(VerbSet::from("nope").is_empty());
}

#[test]
fn verb_serializes_as_snake_case() {
    assert_eq!(serde_json::to_string(&Verb::Mention).unwrap(), "\"mention\"");
    let bits = serde_json::to_string(&(VerbSet::FOLLOW | VerbSet::LIKE)).unwrap();
    assert_eq!(bits, "3");
    let parsed: VerbSet = serde_json::from_str("3").unwrap();
    assert_eq!(parsed, VerbSet::FOLLOW | VerbSet::LIKE);
}
