use super::*;
use crate::core::{Args, StateValue, Transition, TransitionKind};
use crate::state_ids;
use crate::trace::Recorder;
use std::cell::{Cell, RefCell};

#[derive(Default)]
struct Host {
    log: RefCell<Vec<String>>,
    level: StateValue<i32>,
    seen_by_leaf: Cell<i32>,
    root_wants: Cell<Option<Sample>>,
    mid_entry: Cell<Option<Sample>>,
    leaf_sibling: Cell<Option<Sample>>,
    other_sees_itself: Cell<bool>,
    machine: RefCell<Option<StateMachine<Sample>>>,
}

impl Host {
    fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

fn note(scope: &Scope<'_, Sample>, entry: String) {
    if let Some(host) = scope.owner() {
        host.log.borrow_mut().push(entry);
    }
}

#[derive(Default)]
struct Root;
impl State<Sample> for Root {
    fn on_enter(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "enter Root".into());
        let host = ctx.get_owner();
        ctx.set_state_value(&host.level, 1);
    }

    fn on_exit(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "exit Root".into());
    }

    fn get_transition(&self, scope: &Scope<'_, Sample>) -> Transition<Sample> {
        match scope.owner().and_then(|host| host.root_wants.get()) {
            Some(Sample::Greeter) => {
                Transition::inner_with(Sample::Greeter, crate::args![String::from("hello")])
            }
            Some(target) => Transition::inner(target),
            None => Transition::none(),
        }
    }
}

#[derive(Default)]
struct Mid;
impl State<Sample> for Mid {
    fn on_enter(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "enter Mid".into());
    }

    fn on_exit(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "exit Mid".into());
    }

    fn get_transition(&self, scope: &Scope<'_, Sample>) -> Transition<Sample> {
        match scope.owner().and_then(|host| host.mid_entry.get()) {
            Some(target) => Transition::inner_entry(target),
            None => Transition::none(),
        }
    }

    fn update(&mut self, ctx: &mut Context<'_, Sample>, _dt: f32) {
        let host = ctx.get_owner();
        ctx.set_state_value(&host.level, 20);
    }
}

#[derive(Default)]
struct Leaf;
impl State<Sample> for Leaf {
    fn on_enter(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "enter Leaf".into());
        let host = ctx.get_owner();
        ctx.set_state_value(&host.level, 3);
    }

    fn on_exit(&mut self, ctx: &mut Context<'_, Sample>) {
        let host = ctx.get_owner();
        host.log.borrow_mut().push("exit Leaf".into());
    }

    fn get_transition(&self, scope: &Scope<'_, Sample>) -> Transition<Sample> {
        match scope.owner().and_then(|host| host.leaf_sibling.get()) {
            Some(target) => Transition::sibling(target),
            None => Transition::none(),
        }
    }

    fn update(&mut self, ctx: &mut Context<'_, Sample>, _dt: f32) {
        let host = ctx.get_owner();
        host.seen_by_leaf.set(host.level.value());
    }
}

#[derive(Default)]
struct Other;
impl State<Sample> for Other {
    fn on_enter(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "enter Other".into());
    }

    fn on_exit(&mut self, ctx: &mut Context<'_, Sample>) {
        note(ctx, "exit Other".into());
    }

    fn get_transition(&self, scope: &Scope<'_, Sample>) -> Transition<Sample> {
        if let Some(host) = scope.owner() {
            let found = scope
                .find_state(Sample::Other)
                .is_some_and(|state| state.is::<Other>());
            host.other_sees_itself.set(found);
        }
        Transition::none()
    }
}

#[derive(Default)]
struct Ping;
impl State<Sample> for Ping {
    fn get_transition(&self, _scope: &Scope<'_, Sample>) -> Transition<Sample> {
        Transition::sibling(Sample::Pong)
    }
}

#[derive(Default)]
struct Pong;
impl State<Sample> for Pong {
    fn get_transition(&self, _scope: &Scope<'_, Sample>) -> Transition<Sample> {
        Transition::sibling(Sample::Ping)
    }
}

#[derive(Default)]
struct Greeter {
    greeting: String,
}
impl State<Sample> for Greeter {
    fn expects_args(&self) -> bool {
        true
    }

    fn on_enter_with(&mut self, ctx: &mut Context<'_, Sample>, mut args: Args) {
        self.greeting = args.take::<String>(0).unwrap_or_default();
        note(ctx, format!("greet {}", self.greeting));
    }
}

state_ids! {
    enum Sample: Host {
        Root => Root,
        Mid => Mid,
        Leaf => Leaf,
        Other => Other,
        Ping => Ping,
        Pong => Pong,
        Greeter => Greeter,
    }
}

fn machine_for(host: &Rc<Host>) -> StateMachine<Sample> {
    let mut machine = StateMachine::new(Sample::Root);
    machine.init(Sample::Root, host);
    machine
}

#[test]
fn first_update_creates_root_lazily() {
    let host = Rc::new(Host::default());
    let mut machine = machine_for(&host);

    assert!(!machine.is_started());
    assert!(host.take_log().is_empty());

    let resolution = machine.update(0.1);
    assert_eq!(resolution, Resolution::Settled { passes: 1 });
    assert!(machine.is_started());
    assert_eq!(machine.active_states(), vec![Sample::Root]);
    assert_eq!(host.take_log(), vec!["enter Root"]);
}

#[test]
fn nested_transitions_settle_in_one_update() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);

    let resolution = machine.update(0.1);

    assert_eq!(resolution, Resolution::Settled { passes: 3 });
    assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Mid, Sample::Leaf]);
    assert_eq!(machine.stack_string(), "Root / Mid / Leaf");
    assert_eq!(machine.pending_transition(), None);
}

#[test]
fn repeated_inner_to_current_child_is_a_no_op() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    let mut machine = machine_for(&host);

    machine.update(0.1);
    host.take_log();

    for _ in 0..5 {
        assert_eq!(machine.update(0.1), Resolution::Settled { passes: 1 });
    }
    assert!(host.take_log().is_empty());
    assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Mid]);
}

#[test]
fn inner_to_new_child_replaces_subtree() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);
    host.take_log();

    host.root_wants.set(Some(Sample::Other));
    machine.update(0.1);

    assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Other]);
    assert_eq!(
        host.take_log(),
        vec!["exit Leaf", "exit Mid", "enter Other"]
    );
}

#[test]
fn sibling_replaces_requesting_state() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);
    host.take_log();

    host.leaf_sibling.set(Some(Sample::Other));
    machine.update(0.1);

    assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Mid, Sample::Other]);
    assert_eq!(host.take_log(), vec!["exit Leaf", "enter Other"]);
}

#[test]
fn inner_entry_never_overrides_existing_child() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    host.leaf_sibling.set(Some(Sample::Other));
    let mut machine = machine_for(&host);

    for _ in 0..4 {
        assert!(machine.update(0.1).is_settled());
        assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Mid, Sample::Other]);
    }
}

#[test]
fn outer_actions_run_before_inner_actions() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);

    machine.update(0.1);

    // Mid writes 20 in its action and Leaf reads in its own, same tick.
    assert_eq!(host.seen_by_leaf.get(), 20);
    assert_eq!(host.level.value(), 20);
}

#[test]
fn overrides_revert_in_exit_order() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    let mut machine = machine_for(&host);

    machine.resolve();
    assert_eq!(host.level.value(), 1);

    host.mid_entry.set(Some(Sample::Leaf));
    machine.resolve();
    assert_eq!(host.level.value(), 3);

    host.root_wants.set(Some(Sample::Other));
    machine.resolve();
    assert_eq!(host.level.value(), 1);

    machine.stop();
    assert_eq!(host.level.value(), 0);
}

#[test]
fn stop_exits_innermost_first_and_restarts_lazily() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);
    host.take_log();

    machine.shutdown();
    assert!(!machine.is_started());
    assert_eq!(host.take_log(), vec!["exit Leaf", "exit Mid", "exit Root"]);
    assert_eq!(host.level.value(), 0);

    machine.update(0.1);
    assert_eq!(machine.active_states(), vec![Sample::Root, Sample::Mid, Sample::Leaf]);
}

#[test]
fn dropping_machine_reverts_overrides() {
    let host = Rc::new(Host::default());
    {
        let mut machine = machine_for(&host);
        machine.update(0.1);
        assert_eq!(host.level.value(), 1);
    }
    assert_eq!(host.level.value(), 0);
    assert_eq!(host.take_log(), vec!["enter Root", "exit Root"]);
}

#[test]
fn divergence_is_reported_once_per_update() {
    let recorder = Recorder::new();
    let mut machine = StateMachine::new(Sample::Ping);
    machine.set_tracer(recorder.clone());

    let resolution = machine.update(0.1);
    assert_eq!(resolution, Resolution::Diverged { passes: 100 });
    assert_eq!(recorder.divergences().len(), 1);
    assert_eq!(machine.trace_level(), TraceLevel::Diagnostic);
    assert!(machine.is_started());

    machine.update(0.1);
    assert_eq!(recorder.divergences().len(), 2);
}

#[test]
fn trace_level_filters_events() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    let recorder = Recorder::new();
    let mut machine = machine_for(&host);
    machine.set_tracer(recorder.clone());

    machine.update(0.1);
    assert!(recorder.events().is_empty());

    machine.stop();
    machine.set_trace_level(TraceLevel::Basic);
    machine.update(0.1);
    assert_eq!(
        recorder.events_of(TraceKind::Inner),
        vec![(0, Sample::Root), (1, Sample::Mid)]
    );
    assert!(recorder.events_of(TraceKind::Push).is_empty());

    recorder.clear();
    machine.stop();
    machine.set_trace_level(TraceLevel::Diagnostic);
    machine.update(0.1);
    assert_eq!(
        recorder.events_of(TraceKind::Push),
        vec![(0, Sample::Root), (1, Sample::Mid)]
    );

    machine.stop();
    assert_eq!(
        recorder.events_of(TraceKind::Pop),
        vec![(1, Sample::Mid), (0, Sample::Root)]
    );
}

#[test]
fn args_reach_on_enter_with() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Greeter));
    let mut machine = machine_for(&host);

    machine.update(0.1);

    assert_eq!(host.take_log(), vec!["enter Root", "greet hello"]);
    let greeter = machine.get_state(Sample::Greeter).downcast_ref::<Greeter>();
    assert_eq!(greeter.map(|g| g.greeting.as_str()), Some("hello"));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "expects args")]
fn missing_args_is_a_configuration_error() {
    let mut machine = StateMachine::new(Sample::Greeter);
    machine.update(0.1);
}

#[test]
fn machine_lookups() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);

    assert!(machine.find_state(Sample::Mid).is_some());
    assert!(machine.find_state(Sample::Other).is_none());
    assert!(machine.get_state(Sample::Leaf).is::<Leaf>());
    assert!(machine.is_in_state(Sample::Root));

    assert!(machine.find_outer_state(Sample::Root, 2).is_some());
    assert!(machine.find_outer_state(Sample::Leaf, 2).is_none());
    assert!(machine.find_outer_state(Sample::Root, 0).is_none());
    assert!(machine.find_inner_state(Sample::Leaf, 0).is_some());
    assert!(machine.find_inner_state(Sample::Root, 0).is_none());
    assert!(machine.find_inner_state(Sample::Leaf, 9).is_none());

    assert!(machine.has_state_at_depth(2));
    assert!(!machine.has_state_at_depth(3));
    assert_eq!(machine.state_id_at_depth(1), Some(Sample::Mid));
    assert!(machine.find_state_at_depth(0).is_some_and(|s| s.is::<Root>()));
}

#[test]
#[should_panic(expected = "Failed to get state Other")]
fn get_state_panics_when_missing() {
    let mut machine = StateMachine::new(Sample::Other);
    machine.update(0.1);
    machine.get_inner_state(Sample::Other, 0);
}

#[test]
fn visitors_walk_in_requested_order_and_stop_on_break() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);

    let mut seen = Vec::new();
    machine.visit_outer_to_inner(|id, _| {
        seen.push(id);
        ControlFlow::Continue(())
    });
    assert_eq!(seen, vec![Sample::Root, Sample::Mid, Sample::Leaf]);

    let mut seen = Vec::new();
    machine.visit_inner_to_outer(|id, _| {
        seen.push(id);
        if id == Sample::Mid {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(seen, vec![Sample::Leaf, Sample::Mid]);

    let mut touched = 0;
    machine.visit_outer_to_inner_mut(|_, state| {
        if state.downcast_mut::<Leaf>().is_some() {
            touched += 1;
        }
        ControlFlow::Continue(())
    });
    machine.visit_inner_to_outer_mut(|_, _| ControlFlow::Break(()));
    assert_eq!(touched, 1);
}

#[test]
fn pending_transition_reports_next_change() {
    let host = Rc::new(Host::default());
    let mut machine = machine_for(&host);

    assert_eq!(
        machine.pending_transition(),
        Some(Pending {
            depth: 0,
            kind: TransitionKind::Inner,
            target: Sample::Root,
        })
    );

    machine.update(0.1);
    assert_eq!(machine.pending_transition(), None);

    host.root_wants.set(Some(Sample::Other));
    assert_eq!(
        machine.pending_transition(),
        Some(Pending {
            depth: 0,
            kind: TransitionKind::Inner,
            target: Sample::Other,
        })
    );
}

#[test]
fn owner_is_held_weakly() {
    let host = Rc::new(Host::default());
    let mut machine = machine_for(&host);
    assert_eq!(Rc::strong_count(&host), 1);
    assert_eq!(Rc::weak_count(&host), 1);

    drop(host);
    machine.init(Sample::Other, &Rc::new(Host::default()));
    machine.update(0.1);
    assert_eq!(machine.active_states(), vec![Sample::Other]);
}

#[test]
fn scope_lookup_finds_calling_state() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Other));
    let mut machine = machine_for(&host);

    machine.update(0.1);

    assert!(host.other_sees_itself.get());
    assert!(machine.find_state(Sample::Other).is_some());
}

#[test]
fn host_owned_machine_drops_after_host() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let mut machine = machine_for(&host);
    machine.update(0.1);
    assert!(!machine.is_orphaned());

    *host.machine.borrow_mut() = Some(machine);
    let weak = Rc::downgrade(&host);
    drop(host);

    // Leaf's exit hook needs the owner; it must not run once the owner is gone.
    assert!(weak.upgrade().is_none());
}

#[test]
fn orphaned_machine_reverts_without_exit_hooks() {
    let host = Rc::new(Host::default());
    host.root_wants.set(Some(Sample::Mid));
    host.mid_entry.set(Some(Sample::Leaf));
    let recorder = Recorder::new();
    let mut machine = machine_for(&host);
    machine.set_tracer(recorder.clone());
    machine.set_trace_level(TraceLevel::Diagnostic);
    machine.update(0.1);

    drop(host);
    assert!(machine.is_orphaned());
    recorder.clear();
    drop(machine);

    assert_eq!(
        recorder.events_of(TraceKind::Pop),
        vec![(2, Sample::Leaf), (1, Sample::Mid), (0, Sample::Root)]
    );
}

#[test]
fn machine_without_owner_is_never_orphaned() {
    let mut machine = StateMachine::new(Sample::Other);
    machine.update(0.1);
    assert!(!machine.is_orphaned());
}
