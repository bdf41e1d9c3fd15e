/*
 *  tests/scroll_properties.rs
 *
 *  Properties of the info line scroller
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 */

use codlcd::display::scroller::{ScrollMode, Scroller};

const T0: f64 = 500.0;

const TEXTS: [&str; 4] = [
    "Seventeen chars!!",
    "A much longer piece of text than fits on the screen",
    "Sigur Rós – Ágætis byrjun",
    "0123456789abcdefg",
];

#[test]
fn short_text_is_a_single_static_step() {
    for width in 5..=16 {
        let text = "x".repeat(width - 3);
        let steps: Vec<_> = Scroller::new(&text, T0, "1. ", width, ScrollMode::Once).collect();
        assert_eq!(steps, vec![(format!("1. {}", text), None)]);
    }
}

#[test]
fn every_character_is_revealed() {
    for text in TEXTS {
        let windows: Vec<String> = Scroller::new(text, T0, "", 16, ScrollMode::Once).map(|(w, _)| w).collect();
        let chars: Vec<char> = text.chars().collect();
        // each window is a slice at some offset, together they cover the text
        let mut covered = vec![false; chars.len()];
        for w in &windows {
            let w: Vec<char> = w.chars().collect();
            let offset = (0..=chars.len() - w.len())
                .find(|&o| chars[o..o + w.len()] == w[..])
                .unwrap_or_else(|| panic!("window {:?} not in {:?}", w, text));
            covered[offset..offset + w.len()].iter_mut().for_each(|c| *c = true);
        }
        assert!(covered.iter().all(|&c| c), "not all of {:?} shown", text);
    }
}

#[test]
fn once_ends_on_first_window() {
    for text in TEXTS {
        let steps: Vec<_> = Scroller::new(text, T0, "", 16, ScrollMode::Once).collect();
        let first = steps.first().unwrap();
        let last = steps.last().unwrap();
        assert_eq!(last.0, first.0);
        assert_eq!(last.1, None);
        assert!(steps[..steps.len() - 1].iter().all(|(_, t)| t.is_some()));
    }
}

#[test]
fn loop_cycles_forever() {
    for text in TEXTS {
        let mut scroller = Scroller::new(text, T0, "", 16, ScrollMode::Loop);
        let first = scroller.next().unwrap();
        let len = text.chars().count();
        // one full pass is start, stepped offsets and end
        let cycle = len - 16 + 1;
        let rest: Vec<_> = scroller.by_ref().take(cycle * 3).collect();
        assert!(rest.iter().all(|(_, t)| t.is_some()));
        assert_eq!(rest[cycle - 1].0, first.0);
    }
}

#[test]
fn times_never_go_backwards() {
    let mut last = T0;
    for (_, t) in Scroller::new(TEXTS[1], T0, "", 16, ScrollMode::Loop).take(200) {
        let t = t.unwrap();
        assert!(t > last);
        last = t;
    }
}
