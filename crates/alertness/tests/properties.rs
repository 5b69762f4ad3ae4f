use proptest::prelude::*;

use alertness::{
    AlertCommand, AlertnessConfig, AlertnessMonitor, EyeOpenness, FaceId, RatioClassifier,
    RatioSample,
};

const MS: u64 = 1_000_000;

fn frame() -> impl Strategy<Value = (f64, f64, f64, u64)> {
    (0.0_f64..0.5, 0.0_f64..0.5, 0.0_f64..1.2, 0_u64..400)
}

proptest! {
    #[test]
    fn pt_classify_eye_is_monotonic(a in 0.0_f64..1.0, b in 0.0_f64..1.0) {
        let classifier = RatioClassifier::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classifier.classify_eye(low) <= classifier.classify_eye(high));
    }

    #[test]
    fn pt_classify_eye_is_deterministic(ratio in 0.0_f64..1.0) {
        let classifier = RatioClassifier::default();
        prop_assert_eq!(classifier.classify_eye(ratio), classifier.classify_eye(ratio));
    }

    #[test]
    fn pt_alarm_commands_alternate(frames in prop::collection::vec(frame(), 1..300)) {
        let mut monitor = AlertnessMonitor::new(AlertnessConfig::default()).unwrap();
        let face = FaceId(0);
        let mut t = 0;
        let mut playing = false;

        for (left, right, mouth, step_ms) in frames {
            t += step_ms * MS;
            let result = monitor
                .process_frame(face, RatioSample::new(left, right, mouth, t))
                .unwrap();

            for command in &result.commands {
                match command {
                    AlertCommand::StartAlarm => {
                        prop_assert!(!playing, "start issued while playing");
                        playing = true;
                    }
                    AlertCommand::StopAlarm => {
                        prop_assert!(playing, "stop issued while stopped");
                        playing = false;
                    }
                    AlertCommand::SendNotification { .. } => {}
                }
            }
            prop_assert_eq!(playing, monitor.session(face).unwrap().alarm().is_playing());
        }
    }

    #[test]
    fn pt_yawn_count_stays_below_threshold(frames in prop::collection::vec(frame(), 1..300)) {
        let config = AlertnessConfig::default();
        let threshold = config.yawn_threshold;
        let mut monitor = AlertnessMonitor::new(config).unwrap();
        let mut t = 0;

        for (left, right, mouth, step_ms) in frames {
            t += step_ms * MS;
            let result = monitor
                .process_frame(FaceId(0), RatioSample::new(left, right, mouth, t))
                .unwrap();
            prop_assert!(result.yawn_count < threshold);
        }
    }

    #[test]
    fn pt_closure_timer_only_during_closed_run(frames in prop::collection::vec(frame(), 1..200)) {
        let classifier = RatioClassifier::default();
        let mut monitor = AlertnessMonitor::new(AlertnessConfig::default()).unwrap();
        let mut t = 0;

        for (left, right, mouth, step_ms) in frames {
            t += step_ms * MS;
            monitor
                .process_frame(FaceId(0), RatioSample::new(left, right, mouth, t))
                .unwrap();
            let closed = classifier.classify_eye(left) == EyeOpenness::Closed
                || classifier.classify_eye(right) == EyeOpenness::Closed;
            let session = monitor.session(FaceId(0)).unwrap();
            prop_assert_eq!(session.closure().is_running(), closed);
        }
    }
}
