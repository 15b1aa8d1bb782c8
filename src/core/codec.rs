//! Morse codec: text <-> Morse, plus timings and waveform for playback
//!
//! Unknown characters are dropped silently in both directions.

use std::collections::HashMap;
use lazy_static::lazy_static;
use regex::Regex;
use crate::{
    DOT_DURATION_MS, DASH_DURATION_MS, SYMBOL_GAP_MS, LETTER_GAP_MS, WORD_GAP_MS,
    SAMPLES_PER_SYMBOL,
};
use crate::types::{MorseTimingEvent, SignalKind};

const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"), ('B', "-..."), ('C', "-.-."), ('D', "-.."), ('E', "."), ('F', "..-."),
    ('G', "--."), ('H', "...."), ('I', ".."), ('J', ".---"), ('K', "-.-"), ('L', ".-.."),
    ('M', "--"), ('N', "-."), ('O', "---"), ('P', ".--."), ('Q', "--.-"), ('R', ".-."),
    ('S', "..."), ('T', "-"), ('U', "..-"), ('V', "...-"), ('W', ".--"), ('X', "-..-"),
    ('Y', "-.--"), ('Z', "--.."),
    ('0', "-----"), ('1', ".----"), ('2', "..---"), ('3', "...--"), ('4', "....-"),
    ('5', "....."), ('6', "-...."), ('7', "--..."), ('8', "---.."), ('9', "----."),
    ('.', ".-.-.-"), (',', "--..--"), ('?', "..--.."), ('!', "-.-.--"),
    (' ', "/"),
];

lazy_static! {
    static ref TEXT_TO_MORSE: HashMap<char, &'static str> =
        MORSE_TABLE.iter().copied().collect();

    // Word separator is handled by splitting, not by lookup
    static ref MORSE_TO_TEXT: HashMap<&'static str, char> = MORSE_TABLE
        .iter()
        .filter(|(c, _)| *c != ' ')
        .map(|(c, m)| (*m, *c))
        .collect();

    // A line made only of dots, dashes, slashes and spaces, with at least one symbol
    static ref RE_MORSE_LINE: Regex = Regex::new(r"^[\s/]*[.\-][.\-\s/]*$").unwrap();
}

/// Convert text to Morse: uppercase, one token per mappable character,
/// tokens separated by single spaces; a space becomes `/`.
pub fn encode(text: &str) -> String {
    text.to_uppercase()
        .chars()
        .filter_map(|c| TEXT_TO_MORSE.get(&c).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert Morse back to text. Words split on `/`, letters on whitespace;
/// unknown tokens produce nothing. Words are re-joined with a single space.
pub fn decode(morse: &str) -> String {
    morse
        .split('/')
        .map(|word| {
            word.split_whitespace()
                .filter_map(|token| MORSE_TO_TEXT.get(token).copied())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Does this line look like Morse rather than plain text?
pub fn looks_like_morse(line: &str) -> bool {
    RE_MORSE_LINE.is_match(line)
}

/// Timing sequence for a Morse string. Each dot/dash carries its own
/// trailing symbol gap; spaces and slashes add letter/word gaps.
pub fn timings_for(morse: &str) -> Vec<MorseTimingEvent> {
    let mut timings = Vec::new();

    for c in morse.chars() {
        match c {
            '.' => {
                timings.push(MorseTimingEvent::new(SignalKind::Dot, DOT_DURATION_MS));
                timings.push(MorseTimingEvent::new(SignalKind::Gap, SYMBOL_GAP_MS));
            }
            '-' => {
                timings.push(MorseTimingEvent::new(SignalKind::Dash, DASH_DURATION_MS));
                timings.push(MorseTimingEvent::new(SignalKind::Gap, SYMBOL_GAP_MS));
            }
            ' ' => timings.push(MorseTimingEvent::new(SignalKind::Gap, LETTER_GAP_MS)),
            '/' => timings.push(MorseTimingEvent::new(SignalKind::Gap, WORD_GAP_MS)),
            _ => {}
        }
    }

    timings
}

/// Amplitude samples for the waveform view
pub fn waveform_for(morse: &str) -> Vec<f64> {
    let mut samples = Vec::new();

    for c in morse.chars() {
        match c {
            '.' => samples.extend((0..SAMPLES_PER_SYMBOL).map(|i| (i as f64 * 0.5).sin() * 0.5)),
            '-' => samples.extend((0..SAMPLES_PER_SYMBOL * 3).map(|i| (i as f64 * 0.3).sin() * 0.8)),
            _ => samples.extend(std::iter::repeat(0.0).take(SAMPLES_PER_SYMBOL / 2)),
        }
    }

    samples
}

// =============================================================================
// TESTS
// =============================================================================
