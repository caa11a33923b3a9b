use std::{
    cell::{Ref, RefCell},
    convert::Infallible,
    rc::Rc,
};

// TODO record copy events too, so a checker can verify the copy completed
// before the first flush of the destination range

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // ordering barrier was issued
    Fence,
    // one cache line, identified by its start address, left the cache hierarchy
    Flush(usize),
    // emulated write latency charged after a flush, in nanoseconds
    Wait(i64),
}

pub trait Instrument {
    type Error: std::error::Error;

    fn apply_event(&self, event: Event) -> Result<(), Self::Error>;
}

#[derive(Clone)]
pub struct Noop;

impl Instrument for Noop {
    type Error = Infallible;

    fn apply_event(&self, _event: Event) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Collect {
    state: Rc<RefCell<Vec<Event>>>,
}

impl Collect {
    pub fn events(&self) -> Ref<'_, Vec<Event>> {
        self.state.borrow()
    }

    pub fn fences(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Fence))
            .count()
    }

    pub fn flushes(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Flush(_)))
            .count()
    }

    /// Sum of all charged latencies, i e what the emulated flushes cost.
    pub fn waited_ns(&self) -> i64 {
        self.events()
            .iter()
            .map(|e| match e {
                Event::Wait(ns) => *ns,
                _ => 0,
            })
            .sum()
    }
}

impl Instrument for Collect {
    type Error = Infallible;

    fn apply_event(&self, event: Event) -> Result<(), Self::Error> {
        self.state.borrow_mut().push(event);
        Ok(())
    }
}
