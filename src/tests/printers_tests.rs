// src/tests/printers_tests.rs

//! tests for `src/printer/printers.rs`

#![allow(non_snake_case)]

use crate::common::CONT_SEP;
use crate::data::level::Level;
use crate::debug::printers::str_to_String_noraw;
use crate::printer::printers::{color_choice, level_color, Color, ColorChoice, OutputLine, PrinterLogwatch};

use ::termcolor::{Ansi, NoColor};

fn continued() -> OutputLine {
    OutputLine::new(Level::Critical, format!("Error: x{}  at y", CONT_SEP))
}

#[test]
fn test_OutputLine_to_plain() {
    let line = OutputLine::new(Level::Warning, "disk almost full");
    assert_eq!(line.to_plain(), "W disk almost full\n");
    assert_eq!(line.plain_len(), line.to_plain().len());
    let line = OutputLine::new(Level::Neutral, "größe");
    assert_eq!(line.plain_len(), line.to_plain().len());
}

#[test]
fn test_PrinterLogwatch_plain() {
    let mut printer = PrinterLogwatch::new(NoColor::new(Vec::<u8>::new()), false);
    printer.print_protocol_line("<<<logwatch>>>").unwrap();
    printer.print_section_header("/var/log/messages").unwrap();
    printer
        .print_lines(&[continued(), OutputLine::new(Level::Neutral, "context")])
        .unwrap();
    printer.flush().unwrap();
    let out = printer.into_inner().into_inner();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "<<<logwatch>>>\n[[[/var/log/messages]]]\nC Error: x\x01  at y\n. context\n"
    );
}

#[test]
fn test_PrinterLogwatch_tty() {
    let mut printer = PrinterLogwatch::new(NoColor::new(Vec::<u8>::new()), true);
    printer.print_line(&continued()).unwrap();
    printer.print_line(&OutputLine::new(Level::Neutral, "context")).unwrap();
    let out = printer.into_inner().into_inner();
    assert_eq!(String::from_utf8(out).unwrap(), "C Error: x\nCONT:  at y\n. context\n");
}

#[test]
fn test_PrinterLogwatch_tty_colored() {
    let mut printer = PrinterLogwatch::new(Ansi::new(Vec::<u8>::new()), true);
    printer.print_line(&OutputLine::new(Level::Critical, "boom")).unwrap();
    printer.print_line(&OutputLine::new(Level::Neutral, "calm")).unwrap();
    let out = String::from_utf8(printer.into_inner().into_inner()).unwrap();
    assert!(out.starts_with("\x1b["));
    assert!(out.contains("C boom"));
    assert!(out.ends_with("\x1b[0m\n. calm\n"));
}

#[test]
fn test_level_color() {
    assert_eq!(level_color(Level::Critical), Some(Color::Red));
    assert_eq!(level_color(Level::Warning), Some(Color::Yellow));
    assert_eq!(level_color(Level::Neutral), None);
    assert_eq!(color_choice(false), ColorChoice::Never);
    assert_eq!(color_choice(true), ColorChoice::Auto);
}

#[test]
fn test_str_to_String_noraw() {
    assert_eq!(str_to_String_noraw("a\x01b\n"), "a␁b␊");
}
