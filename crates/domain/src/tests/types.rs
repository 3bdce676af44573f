// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, NewUser, Role};

#[test]
fn test_role_round_trip() {
    for role in [Role::Admin, Role::Editor, Role::Viewer] {
        assert_eq!(role.as_str().parse::<Role>(), Ok(role));
    }
}

#[test]
fn test_role_rejects_unknown() {
    assert_eq!(
        "Admin".parse::<Role>(),
        Err(DomainError::InvalidRole(String::from("Admin")))
    );
}

#[test]
fn test_new_user_never_serializes_password() {
    let params: NewUser = NewUser {
        username: String::from("editor1"),
        name: String::from("Editor One"),
        email: String::from("editor1@example.com"),
        role: Role::Editor,
        password: String::from("hunter2hunter2"),
    };

    let json: String = serde_json::to_string(&params).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(!json.contains("password"));
    assert!(json.contains("\"username\":\"editor1\""));

    let debug: String = format!("{params:?}");
    assert!(!debug.contains("hunter2"));
}
