//! Counter demo.
//!
//! Two "displays" follow a counter and its doubled value. A few simulated
//! button clicks increment the counter; each click re-renders both
//! displays. A third memo builds and bumps a private cell inside
//! `untracked`, which records nothing.

use std::sync::Arc;

use parking_lot::Mutex;

use tendril_core::reactive::{create_effect, create_memo, create_signal, untracked, StateCell};
use tendril_core::Result;

/// Stand-in for an on-screen text element.
#[derive(Clone, Default)]
struct Display(Arc<Mutex<String>>);

impl Display {
    fn set_text(&self, text: String) {
        *self.0.lock() = text;
    }

    fn text(&self) -> String {
        self.0.lock().clone()
    }
}

fn main() -> Result<()> {
    let display1 = Display::default();
    let display2 = Display::default();

    let (count, set_count) = create_signal(0);

    let reader = count.clone();
    let doubled = create_memo(move || reader.get() * 2)?;

    {
        let count = count.clone();
        let display = display1.clone();
        create_effect(move |_| display.set_text(format!("Count is: {}", count.get())))?;
    }
    {
        let display = display2.clone();
        create_effect(move |_| display.set_text(format!("Count doubled is: {}", doubled.get())))?;
    }

    create_memo(|| {
        let signal = untracked(|| {
            let test = StateCell::new(0);
            test.set(test.get() + 1);
            test
        });
        println!("{signal:?}");
    })?;

    for _ in 0..3 {
        // button click
        set_count.set(count.get() + 1);
        println!("{} | {}", display1.text(), display2.text());
    }

    Ok(())
}
