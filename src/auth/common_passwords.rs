/// Passwords refused at registration and password change, however well
/// formed. Compared case-insensitively.
pub const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "12345", "1234567",
    "password", "password1", "password12", "password123", "passw0rd", "p@ssw0rd",
    "qwerty", "qwerty123", "qwertyuiop", "1q2w3e4r", "1q2w3e4r5t", "1qaz2wsx",
    "abc123", "abcd1234", "111111", "11111111", "000000", "00000000",
    "123123", "123123123", "654321", "987654321", "666666", "88888888",
    "iloveyou", "iloveyou1", "letmein", "letmein1", "welcome", "welcome1",
    "monkey", "dragon", "football", "baseball", "basketball", "superman",
    "batman", "trustno1", "sunshine", "princess", "master", "shadow",
    "starwars", "whatever", "freedom", "michael", "jennifer", "jordan23",
    "charlie", "donald", "admin", "admin123", "administrator", "login",
    "changeme", "secret", "secret123", "default", "guest", "computer",
    "internet", "zaq12wsx", "asdfghjkl", "asdfasdf", "zxcvbnm", "zxcvbnm123",
    "aa123456", "a1b2c3d4", "qazwsx123", "q1w2e3r4", "q1w2e3r4t5y6", "mustang",
    "hello123", "pokemon", "pikachu", "pokemon123", "charizard", "ashketchum",
    "mypassword", "letmein123", "iloveu", "lovely", "loveme", "hottie",
    "access", "access14", "passpass", "password!", "Password1", "Password123",
];
