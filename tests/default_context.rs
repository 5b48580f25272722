use console_commands::{
    ProgramArguments, VariableFlags, append_to_buffer, create_context, default_context,
    execute_arguments, execute_buffer, execute_single, set_variable_modified_flags, tokenize,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn counter(name: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    default_context().commands().add(name, move |_, _| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    count
}

#[test]
fn test_default_context_is_built_once() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| Arc::as_ptr(default_context()) as usize))
        .collect();

    let ptrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ptrs.iter().all(|p| *p == ptrs[0]));
    assert!(default_context().fallback().is_none());
}

#[test]
fn test_free_functions_forward_to_default_context() {
    let single = counter("it_free_single");
    let buffered = counter("it_free_buffered");

    execute_single("it_free_single a b");
    execute_arguments(&tokenize("it_free_single"));
    append_to_buffer("it_free_buffered;it_free_buffered\n");
    execute_buffer();

    assert_eq!(single.load(Ordering::SeqCst), 2);
    assert_eq!(buffered.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_modified_flags_on_default_context() {
    set_variable_modified_flags(VariableFlags::REPLICATED);
    assert!(
        default_context()
            .variable_modified_flags()
            .contains(VariableFlags::REPLICATED)
    );
}

#[test]
fn test_created_context_falls_back_to_default() {
    let count = counter("it_fallback_target");
    let child = create_context(None);

    child.execute_single("it_fallback_target");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(child.fallback().is_some());

    let grandchild = create_context(Some(&child));
    grandchild.execute_arguments(&ProgramArguments::from(vec!["it_fallback_target".to_string()]));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_appends_from_many_threads_run_exactly_once() {
    let ctx = create_context(None);
    let names: Vec<String> = (0..26).map(|i| format!("it_thread_{}", i)).collect();
    let counts: Vec<Arc<AtomicUsize>> = names
        .iter()
        .map(|name| {
            let count = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&count);
            ctx.commands().add(name, move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            count
        })
        .collect();

    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || ctx.append_to_buffer(&format!("{}\n", name)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    ctx.execute_buffer();

    assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 1));
}
