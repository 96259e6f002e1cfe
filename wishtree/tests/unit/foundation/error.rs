use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CardError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        CardError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(
        CardError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(CardError::media("x").to_string().contains("media error:"));
    assert!(
        CardError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CardError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
