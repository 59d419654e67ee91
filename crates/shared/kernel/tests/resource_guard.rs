use flock_kernel::safe_nanoid;
use flock_kernel::security::resource::ResourceGuard;

#[test]
fn resource_guard_validates_and_strips_prefix() {
    assert_eq!(ResourceGuard::verify("post:Ab3xK9", "post").unwrap(), "Ab3xK9");

    assert_eq!(ResourceGuard::verify("Ab3xK9", "post").unwrap(), "Ab3xK9");

    assert!(ResourceGuard::verify("account:Ab3xK9", "post").is_err());
}

#[test]
fn generated_ids_always_pass() {
    for _ in 0..64 {
        let id = safe_nanoid!();
        assert_eq!(ResourceGuard::verify(&id, "comment").unwrap(), id);
    }
}
