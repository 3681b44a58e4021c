//! Integration Tests for Reactive Cells
//!
//! These tests verify that plain cells, derived cells, listeners and streams
//! work together correctly.

use std::cell::{Cell as Counter, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use nib_core::reactive::same_value;
use nib_core::{cell, derived, read, write, Cell};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test that the factory and the constructor build equivalent cells.
#[test]
fn factory_matches_constructor() {
    let a = cell("foo");
    let b = Cell::new("foo");
    assert_eq!(a.get(), b.get());
    assert!(!a.is_derived());
    // Identity, not structure.
    assert_ne!(a, b);
}

/// Test the free accessor pair against the associated one.
#[test]
fn free_and_associated_accessors_agree() {
    let s = cell("foo");
    assert_eq!(read(&s), "foo");
    write(&s, "bar");
    assert_eq!(Cell::read(&s), "bar");
    Cell::write(&s, "baz");
    assert_eq!(read(&s), "baz");
}

/// Test that separately created cells stay isolated.
#[test]
fn cells_are_unique() {
    let xs: Vec<Cell<&str>> = (0..3).map(|_| cell("foo")).collect();
    assert_eq!(xs.iter().map(read).collect::<Vec<_>>(), vec!["foo", "foo", "foo"]);

    xs[1].set("bar");
    assert_eq!(xs.iter().map(read).collect::<Vec<_>>(), vec!["foo", "bar", "foo"]);
}

/// Test that writing then reading returns the written value.
#[test]
fn write_then_read_round_trips() {
    let c = cell(0.0_f64);
    for v in [1.5, -0.0, 0.0, f64::NAN, f64::INFINITY, 1.5] {
        write(&c, v);
        assert!(same_value(&read(&c), &v));
    }
}

/// Test that map derives a value and follows its source.
#[test]
fn map_follows_source() {
    init_tracing();

    let s = cell("foo".to_string());
    let len = s.map(|x| x.len());
    assert_eq!(len.get(), 3);

    s.set("bing".to_string());
    assert_eq!(len.get(), 4);
}

/// Test that several derived cells share one source.
#[test]
fn derive_from_shared_source() {
    let word = cell("foo".to_string());
    let source = word.clone();
    let len = derived(move |get| get.read(&source).len());
    let source = word.clone();
    let caps = derived(move |get| get.read(&source).to_uppercase());

    assert_eq!(word.get(), "foo");
    assert_eq!(len.get(), 3);
    assert_eq!(caps.get(), "FOO");

    word.set("bing".to_string());
    assert_eq!(word.get(), "bing");
    assert_eq!(len.get(), 4);
    assert_eq!(caps.get(), "BING");
}

/// Test that a derived cell recomputes exactly once per upstream write.
#[test]
fn recomputes_once_per_dependency_write() {
    let calls = Rc::new(Counter::new(0));
    let first = cell("foo".to_string());
    let second = cell("bar".to_string());

    let (count, a, b) = (calls.clone(), first.clone(), second.clone());
    let both = derived(move |get| {
        count.set(count.get() + 1);
        format!("{}{}{}", count.get(), get.read(&a), get.read(&b))
    });

    assert_eq!(both.get(), "1foobar");
    first.set("baz".to_string());
    assert_eq!(both.get(), "2bazbar");
    second.set("bing".to_string());
    assert_eq!(both.get(), "3bazbing");
    first.set("foo".to_string());
    second.set("bar".to_string());
    assert_eq!(both.get(), "5foobar");

    // Same-value writes do not recompute.
    first.set("foo".to_string());
    assert_eq!(calls.get(), 5);
}

/// Test that only the branch read on the latest pass triggers recomputation.
#[test]
fn unread_branch_does_not_recompute() {
    let calls = Rc::new(Counter::new(0));
    let flag = cell(true);
    let x = cell(1);
    let y = cell(2);

    let (count, f, xs, ys) = (calls.clone(), flag.clone(), x.clone(), y.clone());
    let picked = derived(move |get| {
        count.set(count.get() + 1);
        if get.read(&f) {
            get.read(&xs)
        } else {
            get.read(&ys)
        }
    });
    assert_eq!(calls.get(), 1);

    y.set(20);
    assert_eq!(calls.get(), 1);

    x.set(10);
    assert_eq!(calls.get(), 2);
    assert_eq!(picked.get(), 10);

    flag.set(false);
    assert_eq!(calls.get(), 3);
    assert_eq!(picked.get(), 20);

    x.set(11);
    assert_eq!(calls.get(), 3);

    y.set(21);
    assert_eq!(calls.get(), 4);
    assert_eq!(picked.get(), 21);
}

/// Test that listeners of a derived cell see a fully settled value.
#[test]
fn listeners_see_settled_values() {
    let a = cell(1);
    let doubled = a.map(|x| x * 2);
    let (src, dbl) = (a.clone(), doubled.clone());
    let sum = derived(move |get| get.read(&src) + get.read(&dbl));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let current = doubled.clone();
    sum.on_next(move |v| log.borrow_mut().push((*v, current.get())));

    a.set(5);
    assert_eq!(sum.get(), 15);
    // Every value handed to the listener was computed from finished inputs.
    for (value, doubled_then) in seen.borrow().iter() {
        assert_eq!(*value % 3, 0);
        assert_eq!(*doubled_then, 10);
    }
}

/// Test that a same-value write notifies nobody.
#[test]
fn same_value_write_notifies_nobody() {
    let c = cell(f64::NAN);
    let calls = Rc::new(Counter::new(0));
    let count = calls.clone();
    c.on_next(move |_| count.set(count.get() + 1));

    write(&c, f64::NAN);
    assert_eq!(calls.get(), 0);
}

/// Test the stream of values against timed writes.
#[tokio::test]
async fn stream_yields_values_in_order() {
    init_tracing();

    let s = cell("foo");
    let writer = s.clone();

    let consume = async {
        let mut values = Vec::new();
        let mut changes = s.changes();
        while let Some(v) = changes.next().await {
            values.push(v);
            if v == "bing" {
                break;
            }
        }
        values
    };
    let produce = async move {
        for v in ["bar", "baz", "bing"] {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.set(v);
        }
    };

    let (values, ()) = tokio::join!(consume, produce);
    s.set("bong");
    assert_eq!(values, vec!["foo", "bar", "baz", "bing"]);
}

/// Test that breaking out of a stream right away yields the current value.
#[tokio::test]
async fn stream_starts_with_current_value() {
    let s = cell("foo");
    let mut changes = s.changes();
    assert_eq!(changes.next().await, Some("foo"));
}

/// Test a stream over a derived cell.
#[tokio::test]
async fn stream_over_derived_cell() {
    let word = cell("foo".to_string());
    let len = word.map(|w| w.len());
    let mut changes = len.changes();
    assert_eq!(changes.next().await, Some(3));

    let writer = word.clone();
    let (next, ()) = tokio::join!(changes.next(), async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        // Same length: no change reaches the stream.
        writer.set("bar".to_string());
        writer.set("bing".to_string());
    });
    assert_eq!(next, Some(4));
}

/// Test async work that reacts to one cell and writes its result to another.
#[tokio::test]
async fn async_work_follows_changes() {
    init_tracing();

    let query = cell("a".to_string());
    let results: Cell<Vec<String>> = cell(Vec::new());
    let count = results.map(|r| r.len());

    let (queries, out) = (query.clone(), results.clone());
    let search = async move {
        let mut queries = queries.changes();
        while let Some(text) = queries.next().await {
            tokio::time::sleep(Duration::from_millis(1)).await;
            out.set(vec![text.to_uppercase(); text.len()]);
            if text == "abc" {
                break;
            }
        }
    };

    let (input, found) = (query.clone(), results.clone());
    let drive = async move {
        let mut found = found.changes();
        assert_eq!(found.next().await, Some(Vec::new()));

        let mut seen = vec![found.next().await];
        for text in ["ab", "abc"] {
            input.set(text.to_string());
            seen.push(found.next().await);
        }
        seen
    };

    let (seen, ()) = tokio::join!(drive, search);
    assert_eq!(
        seen,
        vec![
            Some(vec!["A".to_string()]),
            Some(vec!["AB".to_string(); 2]),
            Some(vec!["ABC".to_string(); 3]),
        ]
    );
    assert_eq!(count.get(), 3);
}

// ----------------------------------------------------------------------------
// Todo list
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Filter {
    All,
    Incomplete,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    title: String,
    done: bool,
}

struct TodoList {
    filter: Cell<Filter>,
    todos: Cell<Vec<Cell<Todo>>>,
    filtered: Cell<Vec<Cell<Todo>>>,
}

impl TodoList {
    fn new() -> Self {
        let filter = cell(Filter::All);
        let todos: Cell<Vec<Cell<Todo>>> = cell(Vec::new());
        let (f, items) = (filter.clone(), todos.clone());
        let filtered = derived(move |get| match get.read(&f) {
            Filter::All => get.read(&items),
            Filter::Incomplete => get
                .read(&items)
                .into_iter()
                .filter(|todo| !get.read(todo).done)
                .collect(),
            Filter::Complete => get
                .read(&items)
                .into_iter()
                .filter(|todo| get.read(todo).done)
                .collect(),
        });
        Self {
            filter,
            todos,
            filtered,
        }
    }

    fn add(&self, title: &str, done: bool) -> Cell<Todo> {
        let todo = cell(Todo {
            title: title.to_string(),
            done,
        });
        let added = todo.clone();
        self.todos.update(move |todos| {
            let mut todos = todos.clone();
            todos.push(added);
            todos
        });
        todo
    }

    fn remove(&self, todo: &Cell<Todo>) {
        self.todos
            .update(|todos| todos.iter().filter(|t| *t != todo).cloned().collect());
    }

    fn toggle(todo: &Cell<Todo>) {
        todo.update(|t| Todo {
            done: !t.done,
            ..t.clone()
        });
    }

    fn titles(&self) -> Vec<String> {
        self.filtered.get().iter().map(|t| t.get().title).collect()
    }
}

/// Test adding and removing todos.
#[test]
fn todos_react_to_add_and_remove() {
    let list = TodoList::new();
    let todo = list.add("foo", false);
    assert_eq!(
        list.todos.get().iter().map(read).collect::<Vec<_>>(),
        vec![Todo {
            title: "foo".to_string(),
            done: false
        }]
    );

    list.remove(&todo);
    assert!(list.todos.get().is_empty());
    assert!(list.filtered.get().is_empty());
}

/// Test switching the filter.
#[test]
fn todos_react_to_filter() {
    let list = TodoList::new();
    list.add("foo", false);
    list.add("bar", true);
    list.add("baz", false);
    list.add("bing", true);
    assert_eq!(list.titles(), vec!["foo", "bar", "baz", "bing"]);

    list.filter.set(Filter::Complete);
    assert_eq!(list.titles(), vec!["bar", "bing"]);

    list.filter.set(Filter::Incomplete);
    assert_eq!(list.titles(), vec!["foo", "baz"]);
}

/// Test toggling individual todos under a filter.
#[test]
fn todos_react_to_toggle() {
    let list = TodoList::new();
    list.filter.set(Filter::Complete);
    list.add("foo", false);
    list.add("bar", true);
    let baz = list.add("baz", false);
    let bing = list.add("bing", true);
    assert_eq!(list.titles(), vec!["bar", "bing"]);

    TodoList::toggle(&baz);
    assert_eq!(list.titles(), vec!["bar", "baz", "bing"]);

    TodoList::toggle(&bing);
    assert_eq!(list.titles(), vec!["bar", "baz"]);
}

/// Test that todos are not tracked while the filter shows everything.
#[test]
fn todos_untracked_under_all_filter() {
    let list = TodoList::new();
    let foo = list.add("foo", false);
    assert_eq!(foo.listener_count(), 0);

    list.filter.set(Filter::Incomplete);
    assert_eq!(foo.listener_count(), 1);

    list.filter.set(Filter::All);
    assert_eq!(foo.listener_count(), 0);
}
