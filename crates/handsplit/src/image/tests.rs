use super::*;
use Color as C;

fn mkimage<const W: usize, const H: usize>(data: [[Color; W]; H]) -> Image {
    let data = data
        .into_iter()
        .flat_map(|row| row.into_iter())
        .flat_map(|col| col.0)
        .collect::<Vec<_>>();
    Image::from_rgba8(Resolution::new(W as u32, H as u32), &data)
}

#[test]
fn get_set_clear() {
    let mut image = mkimage([[C::RED, C::GREEN], [C::BLUE, C::WHITE]]);
    assert_eq!(image.resolution(), Resolution::new(2, 2));
    assert_eq!(image.get(1, 0), C::GREEN);
    assert_eq!(image.get(0, 1), C::BLUE);

    image.set(1, 1, C::BLACK);
    assert_eq!(image.get(1, 1), C::BLACK);

    image.clear(C::NULL);
    assert!(image.pixels().all(|px| px == C::NULL));
}

#[test]
#[should_panic(expected = "incorrect buffer size")]
fn from_rgba8_wrong_size() {
    Image::from_rgba8(Resolution::new(2, 2), &[0; 15]);
}

#[test]
fn filled_circle() {
    let mut image = Image::new(21, 21);
    draw::circle(&mut image, 10, 10, 11).filled().color(C::BLUE);

    assert_eq!(image.get(10, 10), C::BLUE);
    assert_eq!(image.get(14, 10), C::BLUE);
    assert_eq!(image.get(10, 6), C::BLUE);
    assert_eq!(image.get(0, 0), C::NULL);
    assert_eq!(image.get(20, 20), C::NULL);
}

#[test]
fn outlined_circle() {
    let mut image = Image::new(21, 21);
    draw::circle(&mut image, 10, 10, 11).color(C::RED);

    // Only the outline is drawn, the center stays untouched.
    assert_eq!(image.get(10, 10), C::NULL);
    assert!(image.pixels().any(|px| px == C::RED));
}

#[test]
fn circle_is_clipped() {
    let mut image = Image::new(4, 4);
    draw::circle(&mut image, -2, 2, 5).filled().color(C::RED);
    draw::circle(&mut image, 100, 100, 11).filled().color(C::RED);

    assert_eq!(image.get(0, 2), C::RED);
    assert_eq!(image.get(3, 3), C::NULL);
}

#[test]
fn parse_resolution() {
    assert_eq!(
        "640x480".parse::<Resolution>().unwrap(),
        Resolution::new(640, 480)
    );
    assert_eq!(
        " 320 X 240 ".parse::<Resolution>().unwrap(),
        Resolution::RES_240P
    );
    assert!("640".parse::<Resolution>().is_err());
    assert!("ax480".parse::<Resolution>().is_err());
    assert_eq!(Resolution::RES_480P.to_string(), "640x480");
}

#[test]
fn color_packing() {
    assert_eq!(C::RED.to_0rgb(), 0x00ff0000);
    assert_eq!(C::BLUE.to_0rgb(), 0x000000ff);
    assert_eq!(C::NULL.to_0rgb(), 0);
}
