use proc_macro::TokenStream;
use quote::quote;
use syn::bracketed;
use syn::parse::Parse;
use syn::parse_macro_input;
use syn::token;
use syn::Expr;
use syn::Ident;
use syn::ItemFn;
use syn::Lit;
use syn::LitBool;
use syn::LitInt;
use syn::LitStr;

/// Run an async test with a timeout.
///
/// Must be placed above `#[tokio::test]`. The test body keeps its own
/// return type, so `?` works inside it.
#[proc_macro_attribute]
pub fn async_timeout_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = parse_macro_input!(item as ItemFn);
    let dura = parse_duration::parse(attr.to_string().as_str()).unwrap();
    let secs = LitInt::new(format!("{}", dura.as_secs()).as_str(), sig.ident.span());
    let nanos = LitInt::new(
        format!("{}", dura.subsec_nanos()).as_str(),
        sig.ident.span(),
    );
    let output = &sig.output;
    let stream = quote! {
        #(#attrs)* #vis #sig {
            async fn timeout_test_body() #output #block
            let dura = std::time::Duration::new(#secs, #nanos);
            tokio::time::timeout(dura, timeout_test_body())
                .await
                .expect("Test timed out.")
        }
    };
    stream.into()
}

struct HTTPHeader {
    pub header: String,
}

impl Parse for HTTPHeader {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut header = String::new();
        let ident = Ident::parse(input)?;
        header += ident.to_string().replace("_", "-").as_str();
        loop {
            if input.cursor().eof() {
                break;
            }
            match token::Minus::parse(input) {
                Ok(_) => {}
                Err(_) => {
                    break;
                }
            }
            let ident = Ident::parse(input)?;
            header += "-";
            header += ident.to_string().replace("_", "-").as_str();
        }
        return Ok(Self { header });
    }
}

fn parse_bracketed<T: Parse>(input: syn::parse::ParseStream) -> syn::Result<Vec<T>> {
    let mut list = Vec::new();
    token::Eq::parse(input)?;
    let content;
    bracketed!(content in input);
    while !content.is_empty() {
        list.push(content.parse()?);
        if content.is_empty() {
            break;
        }
        let _: token::Comma = content.parse()?;
    }
    Ok(list)
}

struct FilterHttpMethods {
    pub req: Ident,
    pub typ: Expr,
    pub handle_options: LitBool,
    pub ctx: Option<Expr>,
    pub methods: Vec<Ident>,
    pub cors_methods: Option<Vec<Ident>>,
    pub expose_headers: Option<Vec<String>>,
    pub cors_allow_headers: Option<Vec<String>>,
}

impl Parse for FilterHttpMethods {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let req = Ident::parse(input)?;
        token::Comma::parse(input)?;
        let typ = Expr::parse(input)?;
        token::Comma::parse(input)?;
        let mut methods = Vec::new();
        let handle_options = match Lit::parse(input)? {
            Lit::Bool(s) => s,
            _ => {
                return Err(syn::Error::new(input.span(), "Failed to parse boolean."));
            }
        };
        let ctx = if handle_options.value() {
            token::Comma::parse(input)?;
            Some(Expr::parse(input)?)
        } else {
            None
        };
        let mut cors_methods = None;
        let mut expose_headers = None;
        let mut cors_allow_headers = None;
        loop {
            if input.is_empty() {
                break;
            }
            token::Comma::parse(input)?;
            if input.is_empty() {
                break;
            }
            let method = Ident::parse(input)?;
            if method == "cors_methods" {
                cors_methods.replace(parse_bracketed::<Ident>(input)?);
            } else if method == "expose_headers" {
                let headers = parse_bracketed::<HTTPHeader>(input)?;
                expose_headers.replace(headers.into_iter().map(|h| h.header).collect());
            } else if method == "allow_headers" {
                let headers = parse_bracketed::<HTTPHeader>(input)?;
                cors_allow_headers.replace(headers.into_iter().map(|h| h.header).collect());
            } else {
                methods.push(method);
            }
        }
        Ok(Self {
            req,
            typ,
            handle_options,
            ctx,
            methods,
            cors_methods,
            expose_headers,
            cors_allow_headers,
        })
    }
}

/// Filter http methods.
///
/// `request, 405 body, handle_options[, ctx], [method [, method ...]]`
///
/// When `handle_options` is true, `OPTIONS` answers CORS preflights using
/// `ctx.cors`, and a `builder` carrying the CORS headers is defined for the
/// rest of the handler.
#[proc_macro]
pub fn filter_http_methods(item: TokenStream) -> TokenStream {
    let FilterHttpMethods {
        req,
        typ,
        handle_options,
        ctx,
        methods,
        cors_methods,
        expose_headers,
        cors_allow_headers,
    } = parse_macro_input!(item as FilterHttpMethods);
    let mut header_value = Vec::new();
    let mut streams = Vec::new();
    let mut enable_options = false;
    for method in methods {
        header_value.push(method.to_string());
        if method == "OPTIONS" && handle_options.value() {
            enable_options = true;
        } else {
            streams.push(quote!(&hyper::Method::#method => {}));
        }
    }
    let allow_header = header_value.join(", ");
    let cors_methods_header = match cors_methods {
        Some(methods) => methods
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        None => allow_header.clone(),
    };
    let allow_header = LitStr::new(allow_header.as_str(), req.span());
    let cors_methods_header = LitStr::new(cors_methods_header.as_str(), req.span());
    let expose_headers = expose_headers.map(|h| LitStr::new(h.join(", ").as_str(), req.span()));
    let cors_allow_headers =
        cors_allow_headers.map(|h| LitStr::new(h.join(", ").as_str(), req.span()));
    let post_stream = match (enable_options, ctx) {
        (true, Some(ctx)) => {
            let preflight_expose = match &expose_headers {
                Some(headers) => quote!(
                    let builder = builder.header(hyper::header::ACCESS_CONTROL_EXPOSE_HEADERS, #headers);
                ),
                None => quote!(),
            };
            let preflight_allow = match &cors_allow_headers {
                Some(headers) => quote!(
                    let builder = builder.header(hyper::header::ACCESS_CONTROL_ALLOW_HEADERS, #headers);
                ),
                None => quote!(),
            };
            streams.push(quote!(&hyper::Method::OPTIONS => {
                let builder = hyper::Response::builder();
                let origin = match #req.headers().get(hyper::header::ORIGIN) {
                    Some(origin) => match origin.to_str() {
                        Ok(origin) => Some(origin.to_owned()),
                        Err(_) => None,
                    },
                    None => None,
                };
                match origin {
                    Some(origin) => {
                        match #ctx.cors.matches(origin.as_str()) {
                            crate::server::cors::CorsResult::Allowed => {
                                let builder = builder
                                    .header(hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_str())
                                    .header(hyper::header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true")
                                    .header(hyper::header::ACCESS_CONTROL_ALLOW_METHODS, #cors_methods_header);
                                #preflight_expose
                                #preflight_allow
                                return Ok(builder.status(200).header("Allow", #allow_header).body(#typ)?);
                            }
                            crate::server::cors::CorsResult::AllowedAll => {
                                let builder = builder
                                    .header(hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
                                    .header(hyper::header::ACCESS_CONTROL_ALLOW_METHODS, #cors_methods_header);
                                #preflight_expose
                                #preflight_allow
                                return Ok(builder.status(200).header("Allow", #allow_header).body(#typ)?);
                            }
                            _ => {
                                return Ok(builder.status(400).header("Allow", #allow_header).body(#typ)?);
                            }
                        }
                    }
                    None => {
                        return Ok(builder.status(200).header("Allow", #allow_header).body(#typ)?);
                    }
                }
            }));
            let expose = match &expose_headers {
                Some(headers) => quote!(
                    builder
                        .headers_mut()
                        .try_err(gettext("Failed to build response."))?
                        .insert(hyper::header::ACCESS_CONTROL_EXPOSE_HEADERS, #headers.parse()?);
                ),
                None => quote!(),
            };
            let allow = match &cors_allow_headers {
                Some(headers) => quote!(
                    builder
                        .headers_mut()
                        .try_err(gettext("Failed to build response."))?
                        .insert(hyper::header::ACCESS_CONTROL_ALLOW_HEADERS, #headers.parse()?);
                ),
                None => quote!(),
            };
            quote!(
                let mut builder = hyper::Response::builder();
                let origin = match #req.headers().get(hyper::header::ORIGIN) {
                    Some(origin) => match origin.to_str() {
                        Ok(origin) => Some(origin.to_owned()),
                        Err(_) => None,
                    },
                    None => None,
                };
                match origin {
                    Some(origin) => {
                        use crate::ext::try_err::TryErr;
                        use crate::gettext;
                        match #ctx.cors.matches(origin.as_str()) {
                            crate::server::cors::CorsResult::Allowed => {
                                let headers = builder
                                    .headers_mut()
                                    .try_err(gettext("Failed to build response."))?;
                                headers.insert(hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.parse()?);
                                headers.insert(hyper::header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".parse()?);
                                #expose
                                #allow
                            }
                            crate::server::cors::CorsResult::AllowedAll => {
                                builder
                                    .headers_mut()
                                    .try_err(gettext("Failed to build response."))?
                                    .insert(hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".parse()?);
                                #expose
                                #allow
                            }
                            _ => {
                                return Ok(builder.status(403).body(#typ)?);
                            }
                        }
                    }
                    None => {}
                }
            )
        }
        _ => quote!(
            let builder = hyper::Response::builder();
        ),
    };
    let stream = quote! {
        match #req.method() {
            #(#streams)*
            _ => {
                return Ok(hyper::Response::builder().status(405).header("Allow", #allow_header).body(#typ)?)
            }
        }
        #post_stream
    };
    stream.into()
}
