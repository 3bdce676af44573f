// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::DomainError;

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidSlug(String::from("about us"));
    assert_eq!(format!("{err}"), "Invalid slug: 'about us'");

    let err: DomainError = DomainError::InvalidLabel {
        field: "title",
        reason: String::from("must not be empty"),
    };
    assert_eq!(format!("{err}"), "Invalid title: must not be empty");

    let err: DomainError = DomainError::InvalidUsername(String::from("a b"));
    assert_eq!(format!("{err}"), "Invalid username: 'a b'");

    let err: DomainError = DomainError::InvalidEmail(String::from("nobody"));
    assert_eq!(format!("{err}"), "Invalid email: 'nobody'");

    let err: DomainError = DomainError::InvalidRole(String::from("root"));
    assert_eq!(format!("{err}"), "Invalid role: 'root'");

    let err: DomainError = DomainError::InvalidPassword(String::from("too short"));
    assert_eq!(format!("{err}"), "Invalid password: too short");

    let err: DomainError = DomainError::InvalidDimension {
        field: "width",
        value: -3,
    };
    assert_eq!(format!("{err}"), "Invalid width: -3 must not be negative");

    let err: DomainError = DomainError::InvalidTimestamp {
        value: String::from("yesterday"),
        reason: String::from("bad"),
    };
    assert_eq!(format!("{err}"), "Invalid timestamp 'yesterday': bad");
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidSlug(String::new()));
    assert_eq!(err.to_string(), "Invalid slug: ''");
}
