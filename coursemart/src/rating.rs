//! Rating arithmetic shared by every operation that touches `Course::rating`.
use crate::{Error, Review};

/// Rounds to one decimal place, half away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the given ratings rounded to one decimal place, 0 for no ratings.
pub fn average<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), rating| (sum + rating, count + 1));
    if count == 0 {
        return 0.0;
    }
    round_one_decimal(sum / count as f64)
}

/// Extracts the numeric rating of a review.
///
/// A missing or non-finite rating is a malformed review.
pub fn rating_of(review: &Review) -> Result<f64, Error> {
    match review.rating {
        Some(rating) if rating.is_finite() => Ok(rating),
        _ => Err(Error::MalformedReview(review.id)),
    }
}

/// Averages the ratings of `reviews`, failing on the first malformed one.
pub fn average_of_reviews<'a, I>(reviews: I) -> Result<f64, Error>
where
    I: IntoIterator<Item = &'a Review>,
{
    let ratings = reviews
        .into_iter()
        .map(rating_of)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(average(ratings))
}
