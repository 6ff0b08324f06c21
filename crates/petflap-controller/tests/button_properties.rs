//! Property tests for the button classifier and the settings menu.

use petflap_controller::{ButtonClassifier, ButtonEvent, SettingsMenu};
use proptest::prelude::*;

proptest! {
    #[test]
    fn single_button_hold_reports_its_duration(
        start in any::<u32>(),
        hold in 1u32..120_000,
        red in any::<bool>(),
        samples in 0usize..20,
    ) {
        let mut classifier = ButtonClassifier::new();
        let (g, r) = if red { (false, true) } else { (true, false) };
        prop_assert_eq!(classifier.sample(g, r, start), None);
        for i in 0..samples {
            let at = start.wrapping_add(hold / (samples as u32 + 1) * (i as u32 + 1));
            prop_assert_eq!(classifier.sample(g, r, at), None);
        }
        let press = classifier.sample(false, false, start.wrapping_add(hold));
        let press = press.expect("release emits an event");
        prop_assert_eq!(press.elapsed_ms, hold);
        prop_assert_eq!(press.event, if red { ButtonEvent::Red } else { ButtonEvent::Green });
    }

    #[test]
    fn one_gesture_yields_one_event(
        levels in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..60),
    ) {
        let mut classifier = ButtonClassifier::new();
        let mut events = 0usize;
        let mut releases_to_idle = 0usize;
        let mut prev_any = false;
        for (t, &(g, r)) in levels.iter().chain([(false, false)].iter()).enumerate() {
            if classifier.sample(g, r, t as u32 * 100).is_some() {
                events += 1;
            }
            let any = g || r;
            if prev_any && !any {
                releases_to_idle += 1;
            }
            prev_any = any;
        }
        // Every return to idle closes at least one event, and a gesture
        // never emits more events than it has releases.
        prop_assert!(events >= releases_to_idle);
        prop_assert!(!classifier.any_held());
    }

    #[test]
    fn menu_navigation_is_reversible(steps in 0usize..30) {
        let mut menu = SettingsMenu::new();
        let start = menu.arm();
        for _ in 0..steps {
            menu.forward();
        }
        for _ in 0..steps {
            menu.back();
        }
        prop_assert_eq!(menu.cursor(), start);
        prop_assert!(menu.is_armed());
    }

    #[test]
    fn menu_cycles_every_seven_steps(steps in 0usize..30) {
        let mut menu = SettingsMenu::new();
        menu.arm();
        for _ in 0..steps {
            menu.forward();
        }
        prop_assert_eq!(usize::from(menu.cursor().position()), steps % 7 + 1);
    }
}
