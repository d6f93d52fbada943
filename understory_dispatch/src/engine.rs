// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dispatch driver.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use understory_event_path::{BouncedPath, BuildOptions, EventTree, PathScope};
use understory_listener::{EventPhase, ListenerEntry, ListenerOptions, ListenerRegistry};

use crate::cx::EventCx;
use crate::default_action::ActionSource;
use crate::error::{DispatchError, ListenerFailure};
use crate::event::Event;
use crate::frame::{EventFrame, FrameId};
use crate::sink::{ErrorReport, ErrorSink, TracingSink};

/// A tree the engine can dispatch into.
///
/// On top of the [`EventTree`] walk, a host exposes the native default
/// actions of its nodes, such as following a link when an anchor is clicked.
pub trait DispatchHost: EventTree + Sized {
    /// The native default action of `node` for `event`, if it has one.
    fn native_default_action(&self, node: Self::Node, event: &Event) -> Option<Action<Self>> {
        let _ = (node, event);
        None
    }
}

/// What a listener returns.
pub type ListenerResult = Result<(), ListenerFailure>;

type ListenerFn<H> = dyn Fn(&mut EventCx<'_, H>) -> ListenerResult;

/// A listener callback.
///
/// Listeners compare by identity: clones of one `Listener` are the same
/// listener, two `Listener::new` calls never are.
pub struct Listener<H: DispatchHost>(Rc<ListenerFn<H>>);

impl<H: DispatchHost> Listener<H> {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&mut EventCx<'_, H>) -> ListenerResult + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub(crate) fn call(&self, cx: &mut EventCx<'_, H>) -> ListenerResult {
        (self.0)(cx)
    }
}

impl<H: DispatchHost> Clone for Listener<H> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<H: DispatchHost> PartialEq for Listener<H> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<H: DispatchHost> fmt::Debug for Listener<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

type ActionFn<H> = dyn Fn(&mut Engine<H>, &Event);

/// A default action, native or custom.
///
/// Runs once, after propagation is over, with the engine and the event.
pub struct Action<H: DispatchHost>(Rc<ActionFn<H>>);

impl<H: DispatchHost> Action<H> {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&mut Engine<H>, &Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Run the action.
    pub fn run(&self, engine: &mut Engine<H>, event: &Event) {
        (self.0)(engine, event);
    }
}

impl<H: DispatchHost> Clone for Action<H> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<H: DispatchHost> fmt::Debug for Action<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A unit of work for the engine's next turn.
pub struct Task<H: DispatchHost>(Box<dyn FnOnce(&mut Engine<H>)>);

impl<H: DispatchHost> fmt::Debug for Task<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task")
    }
}

/// Run a dispatch to completion, or one phase per task.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Every listener and the default action run before `dispatch_event` returns.
    #[default]
    Sync,
    /// Each phase batch runs in its own task; see [`Engine::run_until_idle`].
    Async,
}

/// Options for [`Engine::dispatch_event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatchOptions<K> {
    /// Sync or async.
    pub mode: DispatchMode,
    /// Stop the path at this boundary (inclusive).
    pub root: Option<K>,
}

impl<K> Default for DispatchOptions<K> {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Sync,
            root: None,
        }
    }
}

impl<K> DispatchOptions<K> {
    /// Options for an asynchronous dispatch.
    pub fn asynchronous() -> Self {
        Self {
            mode: DispatchMode::Async,
            root: None,
        }
    }

    /// Set an explicit propagation root.
    #[must_use]
    pub fn with_root(mut self, root: K) -> Self {
        self.root = Some(root);
        self
    }
}

/// Summary of a completed dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Source of the default action that ran, if one did.
    pub default_action: Option<ActionSource>,
    /// Whether any context prevented its default action.
    pub default_prevented: bool,
    /// Number of listener invocations.
    pub listeners_invoked: usize,
}

/// Result of [`Engine::dispatch_event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The dispatch ran to completion.
    Completed(Report),
    /// The dispatch was queued; it makes progress as tasks run.
    Scheduled(FrameId),
}

impl DispatchOutcome {
    /// The report of a completed dispatch.
    pub fn report(&self) -> Option<Report> {
        match self {
            Self::Completed(report) => Some(*report),
            Self::Scheduled(_) => None,
        }
    }
}

pub(crate) type Frame<H> = EventFrame<<H as EventTree>::Node, Action<H>>;

struct ActiveFrame<H: DispatchHost> {
    frame: Frame<H>,
    invoked: usize,
}

/// The event engine: a host tree, its listeners and the dispatch machinery.
///
/// Everything is single threaded. Listeners receive an [`EventCx`] that
/// borrows the engine mutably, so they can register listeners, mutate the
/// host, schedule tasks and dispatch nested events.
pub struct Engine<H: DispatchHost> {
    host: H,
    registry: ListenerRegistry<H::Node, Listener<H>>,
    stack: Vec<ActiveFrame<H>>,
    suspended: HashMap<FrameId, ActiveFrame<H>>,
    tasks: VecDeque<Task<H>>,
    sink: Box<dyn ErrorSink>,
    next_frame: u64,
    reporting: usize,
}

impl<H: DispatchHost> fmt::Debug for Engine<H>
where
    H: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("host", &self.host)
            .field("dispatch_depth", &self.stack.len())
            .field("suspended", &self.suspended.len())
            .field("pending_tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl<H: DispatchHost + 'static> Engine<H> {
    /// An engine over `host` that reports uncaught failures through `tracing`.
    pub fn new(host: H) -> Self {
        Self::with_sink(host, TracingSink)
    }

    /// An engine with a custom sink for uncaught listener failures.
    pub fn with_sink(host: H, sink: impl ErrorSink + 'static) -> Self {
        Self {
            host,
            registry: ListenerRegistry::new(),
            stack: Vec::new(),
            suspended: HashMap::new(),
            tasks: VecDeque::new(),
            sink: Box::new(sink),
            next_frame: 0,
            reporting: 0,
        }
    }

    /// The host tree.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host tree, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the engine and return the host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// The listener registry.
    pub fn registry(&self) -> &ListenerRegistry<H::Node, Listener<H>> {
        &self.registry
    }

    /// Number of dispatches currently running, nested ones included.
    pub fn dispatch_depth(&self) -> usize {
        self.stack.len()
    }

    /// Register a listener.
    ///
    /// Returns `Ok(false)` if the same listener is already registered with the
    /// same capture flag.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Listener`] when the options violate the `first`/`last` rules.
    pub fn add_event_listener(
        &mut self,
        target: H::Node,
        event_type: &str,
        listener: &Listener<H>,
        options: ListenerOptions,
    ) -> Result<bool, DispatchError> {
        Ok(self
            .registry
            .add(target, event_type, listener.clone(), options)?)
    }

    /// Remove a listener registered with the same capture flag.
    pub fn remove_event_listener(
        &mut self,
        target: H::Node,
        event_type: &str,
        listener: &Listener<H>,
        options: ListenerOptions,
    ) -> bool {
        self.registry.remove(target, event_type, listener, options)
    }

    /// Remove every listener registered on `target`.
    pub fn remove_all_listeners(&mut self, target: H::Node) {
        self.registry.remove_all(target);
    }

    /// Drop the listeners of every target the host no longer treats as an
    /// event target. Returns the number of targets dropped.
    ///
    /// Call after freeing nodes so the registry does not keep their lists.
    pub fn prune_listeners(&mut self) -> usize {
        let host = &self.host;
        let pruned = self.registry.retain_targets(|node| host.is_event_target(node));
        if pruned > 0 {
            tracing::debug!(pruned, "dropped listeners of dead targets");
        }
        pruned
    }

    /// Dispatch `event` at `target`.
    ///
    /// The path is built once, up front: a bubbling or composed event crosses
    /// boundaries, any other event stays in the target's context.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::AlreadyDispatched`] if the event was dispatched before.
    /// - [`DispatchError::Path`] for a dead target or an invalid root.
    /// - [`DispatchError::StackOrder`] if the dispatch stack was corrupted.
    pub fn dispatch_event(
        &mut self,
        target: H::Node,
        event: impl Into<Rc<Event>>,
        options: DispatchOptions<H::Node>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let event = event.into();
        if event.is_dispatched() {
            return Err(DispatchError::AlreadyDispatched);
        }
        let scope = if event.bubbles() || event.composed() {
            PathScope::Bounce
        } else {
            PathScope::Local
        };
        let build = BuildOptions {
            root: options.root,
            scope,
        };
        let path = BouncedPath::build(&self.host, target, &build)?;
        event.mark_dispatched();

        let id = FrameId(self.next_frame);
        self.next_frame += 1;
        tracing::debug!(
            event_type = event.event_type(),
            ?target,
            contexts = path.contexts().len(),
            mode = ?options.mode,
            depth = self.stack.len(),
            "dispatch started"
        );
        let active = ActiveFrame {
            frame: EventFrame::new(id, event, path),
            invoked: 0,
        };

        match options.mode {
            DispatchMode::Sync => {
                self.stack.push(active);
                self.walk(None);
                let active = self.pop_frame(id)?;
                Ok(DispatchOutcome::Completed(self.finish(active)))
            }
            DispatchMode::Async => {
                self.suspended.insert(id, active);
                self.schedule(move |engine| engine.run_async_batch(id));
                Ok(DispatchOutcome::Scheduled(id))
            }
        }
    }

    /// Queue `task` for a later turn.
    pub fn schedule(&mut self, task: impl FnOnce(&mut Self) + 'static) {
        self.tasks.push_back(Task(Box::new(task)));
    }

    /// Run the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_next_task(&mut self) -> bool {
        match self.tasks.pop_front() {
            Some(Task(task)) => {
                task(self);
                true
            }
            None => false,
        }
    }

    /// Run tasks, including ones queued meanwhile, until the queue is empty.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }

    /// Number of queued tasks.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn frame(&self, depth: usize) -> &Frame<H> {
        &self.stack[depth].frame
    }

    pub(crate) fn frame_mut(&mut self, depth: usize) -> &mut Frame<H> {
        &mut self.stack[depth].frame
    }

    pub(crate) fn host_and_frame(&mut self, depth: usize) -> (&H, &mut Frame<H>) {
        (&self.host, &mut self.stack[depth].frame)
    }

    /// Invoke listeners of the top frame until it is exhausted, or until the
    /// next listener belongs to another phase.
    fn walk(&mut self, phase: Option<EventPhase>) {
        let depth = self.stack.len() - 1;
        self.registry.begin_walk();
        loop {
            let frame = &mut self.stack[depth].frame;
            let entry = match phase {
                Some(phase) => frame.next_in_phase(&mut self.registry, phase),
                None => frame.next(&mut self.registry),
            };
            let Some(entry) = entry else {
                break;
            };
            self.stack[depth].invoked += 1;
            self.invoke(depth, &entry);
        }
        self.registry.end_walk();
    }

    fn invoke(&mut self, depth: usize, entry: &ListenerEntry<H::Node, Listener<H>>) {
        let event = self.frame(depth).event().clone();
        tracing::trace!(
            event_type = event.event_type(),
            node = ?entry.target(),
            phase = ?self.frame(depth).event_phase(),
            options = ?entry.options(),
            "invoking listener"
        );
        let listener = entry.listener().clone();
        let mut cx = EventCx::new(self, depth, entry.options());
        if let Err(failure) = listener.call(&mut cx) {
            self.report_failure(&event, failure);
        }
    }

    fn pop_frame(&mut self, id: FrameId) -> Result<ActiveFrame<H>, DispatchError> {
        match self.stack.pop() {
            Some(active) if active.frame.id() == id => Ok(active),
            Some(active) => {
                let found = Some(active.frame.id());
                self.stack.push(active);
                Err(DispatchError::StackOrder {
                    expected: id,
                    found,
                })
            }
            None => Err(DispatchError::StackOrder {
                expected: id,
                found: None,
            }),
        }
    }

    /// Resolve and run the default action of a popped frame.
    fn finish(&mut self, active: ActiveFrame<H>) -> Report {
        let ActiveFrame { frame, invoked } = active;
        let event = frame.event().clone();
        let host = &self.host;
        let resolved = frame.resolve(|node| host.native_default_action(node, &event));
        let report = Report {
            default_action: resolved.as_ref().map(|r| r.source),
            default_prevented: frame.actions().any_prevented(),
            listeners_invoked: invoked,
        };
        tracing::debug!(
            event_type = event.event_type(),
            target = ?frame.path().target(),
            listeners = invoked,
            default_action = ?report.default_action,
            default_prevented = report.default_prevented,
            "dispatch finished"
        );
        if let Some(resolved) = resolved {
            resolved.action.run(self, &event);
        }
        report
    }

    fn run_async_batch(&mut self, id: FrameId) {
        let Some(active) = self.suspended.remove(&id) else {
            return;
        };
        let phase = active.frame.pending_phase();
        self.stack.push(active);
        if phase.is_some() {
            self.walk(phase);
        }
        let active = match self.pop_frame(id) {
            Ok(active) => active,
            Err(err) => {
                tracing::error!(error = %err, "asynchronous dispatch aborted");
                return;
            }
        };
        if active.frame.is_finished() {
            self.finish(active);
        } else {
            self.suspended.insert(id, active);
            self.schedule(move |engine| engine.run_async_batch(id));
        }
    }

    /// Report a listener failure as an `error` event at `window` on the next
    /// turn, or straight to the sink while an `error` event is in flight.
    fn report_failure(&mut self, event: &Event, failure: ListenerFailure) {
        let report = ErrorReport {
            event_type: event.event_type().to_string(),
            message: failure.message().to_string(),
        };
        tracing::debug!(
            event_type = %report.event_type,
            message = %report.message,
            "listener failed"
        );
        if self.reporting > 0 {
            self.sink.report(&report);
            return;
        }
        self.schedule(move |engine| engine.dispatch_error_event(report));
    }

    fn dispatch_error_event(&mut self, report: ErrorReport) {
        let window = self.host.window();
        let event = Event::new("error").with_detail(report.clone());
        self.reporting += 1;
        let outcome = self.dispatch_event(window, event, DispatchOptions::default());
        self.reporting -= 1;
        match outcome {
            Ok(DispatchOutcome::Completed(r)) if r.default_prevented => {}
            _ => self.sink.report(&report),
        }
    }
}
