use crossterm::event::Event as CrosstermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use tui_textarea::Input;
use tui_textarea::Key;

use super::map_crossterm;
use super::map_input;
use crate::domain::models::Event;

fn key(key: Key, ctrl: bool) -> Input {
    return Input {
        key,
        ctrl,
        alt: false,
    };
}

#[test]
fn it_maps_scrolling_keys() {
    assert!(matches!(map_input(key(Key::Up, false)), Event::UIScrollUp()));
    assert!(matches!(
        map_input(key(Key::Down, false)),
        Event::UIScrollDown()
    ));
    assert!(matches!(
        map_input(key(Key::Char('u'), true)),
        Event::UIScrollPageUp()
    ));
    assert!(matches!(
        map_input(key(Key::PageDown, false)),
        Event::UIScrollPageDown()
    ));
}

#[test]
fn it_maps_control_keys() {
    assert!(matches!(
        map_input(key(Key::Char('c'), true)),
        Event::KeyboardCTRLC()
    ));
    assert!(matches!(
        map_input(key(Key::Enter, false)),
        Event::KeyboardEnter()
    ));
}

#[test]
fn it_passes_text_through() {
    match map_input(key(Key::Char('c'), false)) {
        Event::KeyboardCharInput(input) => assert!(matches!(input.key, Key::Char('c'))),
        _ => panic!("Wrong enum"),
    }
}

#[test]
fn it_maps_terminal_events() {
    let event = map_crossterm(CrosstermEvent::Key(KeyEvent::new(
        KeyCode::Enter,
        KeyModifiers::NONE,
    )));
    assert!(matches!(event, Some(Event::KeyboardEnter())));

    let event = map_crossterm(CrosstermEvent::Paste("report.pdf".to_string()));
    assert!(matches!(event, Some(Event::KeyboardPaste(text)) if text == "report.pdf"));

    let event = map_crossterm(CrosstermEvent::Resize(80, 24));
    assert!(matches!(event, Some(Event::UIResize())));

    assert!(map_crossterm(CrosstermEvent::FocusGained).is_none());
}
