use super::*;

struct Join;
struct Quit;

impl TriggerContext for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TriggerContext for Quit {
    fn name(&self) -> &'static str {
        "quit"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn kind_is_exact_type_identity() {
    let join: &dyn TriggerContext = &Join;
    assert_eq!(join.kind(), ContextKind::of::<Join>());
    assert_ne!(join.kind(), ContextKind::of::<Quit>());
    assert_eq!(ContextKind::of::<Join>().name(), "Join");
}

#[test]
fn downcast_to_concrete_context() {
    let quit: &dyn TriggerContext = &Quit;
    assert!(quit.downcast_ref::<Quit>().is_some());
    assert!(quit.downcast_ref::<Join>().is_none());
}
