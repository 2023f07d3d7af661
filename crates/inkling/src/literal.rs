//! Parser for the canonical value text produced by `Display for Value`.
//!
//! Accepts numbers (`-inf`, `NaN`, exponents, `n/d`), `true`/`false`,
//! strings, errors (`\"message"`), arrays and matrices, dictionaries,
//! ranges with an optional `__step`, type tags and identifiers.

use crate::array::Array;
use crate::error::Fault;
use crate::range::{Range, RangeShape};
use crate::types::TypeTag;
use crate::value::Value;
use chumsky::prelude::*;

pub type ParseError<'src> = Rich<'src, char>;

pub fn parse(text: &str) -> Result<Value, Vec<ParseError<'_>>> {
    value().padded().then_ignore(end()).parse(text).into_result()
}

fn numeral(text: &str) -> Option<Value> {
    if text.contains(['.', 'e', 'E']) {
        return text.parse::<f64>().ok().map(Value::Double);
    }
    match text.parse::<i64>() {
        Ok(int) => Some(Value::Int(int)),
        // Too wide for Int, widened like an overflowing result
        Err(_) => text.parse::<f64>().ok().map(Value::Double),
    }
}

fn number<'src>() -> impl Parser<'src, &'src str, Value, extra::Err<ParseError<'src>>> + Clone {
    let integer = just('-').or_not().then(text::digits(10)).to_slice();

    let rational = integer
        .then_ignore(just('/'))
        .then(text::digits(10).to_slice())
        .try_map(|(numer, denom): (&str, &str), span| {
            let ratio = numer.parse::<i64>().ok().zip(denom.parse::<i64>().ok());
            match ratio {
                Some((_, 0)) => Err(Rich::custom(span, "zero denominator")),
                Some((numer, denom)) => Ok(Value::rational(numer, denom)),
                None => Err(Rich::custom(span, format!("{numer}/{denom} does not fit a ratio"))),
            }
        });

    let decimal = integer
        .then(just('.').then(text::digits(10)).or_not())
        .then(one_of("eE").then(one_of("+-").or_not()).then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|text: &str, span| {
            numeral(text).ok_or_else(|| Rich::custom(span, format!("`{text}` is not a number")))
        });

    choice((
        just("-inf").to(Value::Double(f64::NEG_INFINITY)),
        rational,
        decimal,
    ))
}

fn value<'src>() -> impl Parser<'src, &'src str, Value, extra::Err<ParseError<'src>>> + Clone {
    recursive(|value| {
        let word = any()
            .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
            .then(any().filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_').repeated())
            .to_slice()
            .map(|word: &str| match word {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "inf" => Value::Double(f64::INFINITY),
                "NaN" => Value::Double(f64::NAN),
                word => TypeTag::from_name(word).map_or_else(|| Value::identifier(word), Value::TypeTag),
            });

        let escape = just('\\').ignore_then(choice((
            just('\\'),
            just('"'),
            just('n').to('\n'),
            just('t').to('\t'),
        )));
        let quoted = none_of("\\\"")
            .or(escape)
            .repeated()
            .collect::<String>()
            .delimited_by(just('"'), just('"'));

        let string = quoted.clone().map(Value::string);
        let error = just('\\')
            .ignore_then(quoted)
            .map(|message| Value::from(Fault::user(message)));

        let endpoint = just("...").to(None).or(value.clone().map(Some));
        let range = one_of("[(")
            .then(endpoint.clone().padded())
            .then_ignore(just(','))
            .then(endpoint.padded())
            .then(one_of("])"))
            .then(just("__").ignore_then(number()).or_not())
            .try_map(|((((open, lower), upper), close), delta), span| {
                let shape = RangeShape::from_parts(
                    lower.is_some(),
                    open == '(',
                    upper.is_some(),
                    close == ')',
                )
                .ok_or_else(|| Rich::custom(span, "an open lower bound needs an upper bound"))?;
                let range = Range::new(shape, lower, upper).and_then(|range| match &delta {
                    Some(delta) => range.with_delta(delta),
                    None => Ok(range),
                });
                range
                    .map(Value::from)
                    .map_err(|fault| Rich::custom(span, fault.message))
            });

        let array = value
            .clone()
            .padded()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just('(').padded(), just(')'))
            .then(just(';').or_not())
            .try_map(|(items, grouped), span| {
                let array = Array::new(items);
                match grouped {
                    None => Ok(Value::Array(array)),
                    Some(_) => array
                        .grouped()
                        .map(Value::Array)
                        .map_err(|fault| Rich::custom(span, fault.message)),
                }
            });

        let entry = value
            .clone()
            .padded()
            .then_ignore(just(':'))
            .then(value.padded());
        let dictionary = entry
            .separated_by(just(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .padded()
            .delimited_by(just('{'), just('}'))
            .map(Value::dictionary);

        choice((number(), word, string, error, range, array, dictionary))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Bounds;

    fn parsed(text: &str) -> Value {
        match parse(text) {
            Ok(value) => value,
            Err(errors) => panic!("`{text}` failed: {errors:?}"),
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(parsed("42"), Value::Int(42));
        assert_eq!(parsed("-7"), Value::Int(-7));
        assert_eq!(parsed("2.5"), Value::Double(2.5));
        assert_eq!(parsed("1e-7"), Value::Double(1e-7));
        assert_eq!(parsed("-1/3"), Value::rational(-1, 3));
        assert_eq!(parsed("4/2"), Value::Int(2));
        assert_eq!(parsed("-inf"), Value::Double(f64::NEG_INFINITY));
        assert_eq!(parsed("99999999999999999999"), Value::Double(1e20));
        assert!(matches!(parsed("NaN"), Value::Double(d) if d.is_nan()));
        assert!(parse("1/0").is_err());
    }

    #[test]
    fn words() {
        assert_eq!(parsed("true"), Value::Bool(true));
        assert_eq!(parsed("Number"), Value::TypeTag(TypeTag::Number));
        assert_eq!(parsed("speed_2"), Value::identifier("speed_2"));
    }

    #[test]
    fn strings_and_errors() {
        assert_eq!(parsed(r#""a \"b\"\n""#), Value::string("a \"b\"\n"));
        let error = parsed(r#"\"broken""#);
        assert_eq!(error.as_error().map(|fault| fault.message.as_str()), Some("broken"));
    }

    #[test]
    fn containers() {
        assert_eq!(parsed("( 1 2  3 )"), Value::array([1, 2, 3].map(Value::Int)));
        assert_eq!(parsed("()"), Value::nil());
        let matrix = parsed("((1 2) (3 4));");
        assert_eq!(matrix.as_array().map(Array::dimension), Some(2));
        assert!(parse("((1 2) (3));").is_err());
        assert_eq!(
            parsed(r#"{"a": 1, b: (2)}"#),
            Value::dictionary([
                (Value::string("a"), Value::Int(1)),
                (Value::identifier("b"), Value::array([Value::Int(2)])),
            ])
        );
    }

    #[test]
    fn ranges() {
        let closed = Range::build(Bounds::Closed, &Value::Int(0), &Value::Int(10)).unwrap();
        let stepped = closed.with_delta(&Value::Int(2)).unwrap();
        assert_eq!(parsed("[0, 10]__2"), Value::from(stepped));
        let from = Range::build(Bounds::HalfOpen, &Value::Double(0.5), &Value::nil()).unwrap();
        assert_eq!(parsed("[0.5, ...)"), Value::from(from));
        assert!(parse("(1, ...)").is_err());
        assert!(parse("[0, 1]__-1").is_err());
    }

    #[test]
    fn rendering_parses_back() {
        let values = [
            Value::Int(i64::MIN),
            Value::rational(5, 7),
            Value::Double(-0.125),
            Value::Double(1e21),
            Value::string("tab\there \\ \"quoted\""),
            Value::array([Value::Bool(false), Value::string("x"), Value::nil()]),
            Value::dictionary([
                (Value::Int(1), Value::array([Value::Double(2.0)])),
                (Value::string("k"), Value::rational(-3, 2)),
            ]),
            Value::from(Range::build(Bounds::Open, &Value::nil(), &Value::Int(3)).unwrap()),
            Value::from(
                Range::build(Bounds::OpenClosed, &Value::Int(1), &Value::Int(2))
                    .and_then(|range| range.with_delta(&Value::rational(1, 4)))
                    .unwrap(),
            ),
            Value::Array(
                Array::matrix(vec![Value::array([Value::Int(1), Value::Int(2)])])
                    .and_then(|matrix| matrix.removed(&Value::Int(0)))
                    .unwrap(),
            ),
        ];
        for value in values {
            let text = value.to_string();
            assert_eq!(parsed(&text), value, "{text}");
        }
    }
}
