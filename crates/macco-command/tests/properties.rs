//! Property tests for argument partitioning, help layout and dispatch order.

use std::cell::Cell;
use std::rc::Rc;

use macco_command::{Argument, Command, CommandRegistry, Dispatch, Precondition};
use macco_types::error::MaccoError;
use proptest::prelude::*;

/// Arguments with distinct names and random optionality.
fn arguments() -> impl Strategy<Value = Vec<Argument>> {
    prop::collection::vec(any::<bool>(), 0..8).prop_map(|flags| {
        flags
            .into_iter()
            .enumerate()
            .map(|(i, optional)| Argument::new(format!("arg{i}"), format!("Argument {i}."), optional))
            .collect()
    })
}

proptest! {
    #[test]
    fn partition_is_total_and_order_preserving(args in arguments()) {
        let cmd = Command::new("probe", "Probe.", args.clone(), |_: &[&str]| {}).unwrap();

        prop_assert_eq!(
            cmd.required_arguments().len() + cmd.optional_arguments().len(),
            args.len()
        );

        let required: Vec<Argument> = args.iter().filter(|a| !a.is_optional()).cloned().collect();
        let optional: Vec<Argument> = args.iter().filter(|a| a.is_optional()).cloned().collect();
        prop_assert_eq!(cmd.required_arguments(), required.as_slice());
        prop_assert_eq!(cmd.optional_arguments(), optional.as_slice());
        prop_assert_eq!(cmd.min_args(), required.len());
    }

    #[test]
    fn help_has_one_line_per_argument_plus_usage(args in arguments()) {
        let cmd = Command::new("probe", "Probe.", args.clone(), |_: &[&str]| {}).unwrap();
        let help = cmd.help();
        prop_assert_eq!(help.lines().count(), 1 + args.len());
        for (line, arg) in help.lines().skip(1).zip(&args) {
            prop_assert_eq!(line, format!("\t{}", arg.help()));
        }
    }

    #[test]
    fn unusable_never_reports_usage(args in arguments(), provided in 0usize..10) {
        let cmd = Command::new("probe", "Probe.", args, |_: &[&str]| {})
            .unwrap()
            .with_preconditions([Rc::new(|| false) as Precondition]);
        let mut reg = CommandRegistry::new();
        reg.register(cmd).unwrap();

        let tokens: Vec<String> = (0..provided).map(|i| format!("v{i}")).collect();
        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let is_unavailable = matches!(reg.dispatch("probe", &refs), Err(MaccoError::Unavailable { .. }));
        prop_assert!(is_unavailable);
    }

    #[test]
    fn blank_lines_never_invoke(spaces in "[ \t]{0,12}") {
        let invoked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&invoked);
        let mut reg = CommandRegistry::new();
        reg.register(Command::new("quit", "Quit.", vec![], move |_: &[&str]| flag.set(true)).unwrap())
            .unwrap();

        prop_assert_eq!(reg.handle_line(&spaces).unwrap(), Dispatch::Empty);
        prop_assert!(!invoked.get());
    }
}
